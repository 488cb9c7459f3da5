//! Vegetation index calculation
//!
//! NDVI, SAVI, EVI and GNDVI are computed per pixel from the bands nearest to
//! the red, near-infrared, green and blue reference wavelengths. A vanishing
//! denominator yields 0 for that pixel, and non-finite values are replaced by
//! 0 before any aggregation.

use ndarray::{Array2, ArrayView2};
use shared::{IndexSummary, VegetationIndicesReport};

use super::error::{PipelineError, PipelineResult};
use super::spectral::SpectralCube;

pub const RED_NM: f64 = 660.0;
pub const NIR_NM: f64 = 800.0;
pub const GREEN_NM: f64 = 560.0;
/// Blue proxy used by EVI
pub const BLUE_NM: f64 = 480.0;

/// SAVI soil brightness correction factor
pub const SOIL_BRIGHTNESS_L: f64 = 0.5;

/// NDVI above which a pixel counts as vegetated
pub const VEGETATION_NDVI_THRESHOLD: f64 = 0.2;

const DENOMINATOR_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VegetationIndex {
    Ndvi,
    Savi,
    Evi,
    Gndvi,
}

impl VegetationIndex {
    pub const ALL: [VegetationIndex; 4] = [
        VegetationIndex::Ndvi,
        VegetationIndex::Savi,
        VegetationIndex::Evi,
        VegetationIndex::Gndvi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VegetationIndex::Ndvi => "NDVI",
            VegetationIndex::Savi => "SAVI",
            VegetationIndex::Evi => "EVI",
            VegetationIndex::Gndvi => "GNDVI",
        }
    }
}

/// Per-pixel index maps of one cube
#[derive(Debug, Clone)]
pub struct VegetationIndexSet {
    pub ndvi: Array2<f64>,
    pub savi: Array2<f64>,
    pub evi: Array2<f64>,
    pub gndvi: Array2<f64>,
    /// Percentage (0-100) of pixels with NDVI above the vegetation threshold
    pub vegetation_coverage_percent: f64,
}

impl VegetationIndexSet {
    pub fn get(&self, index: VegetationIndex) -> &Array2<f64> {
        match index {
            VegetationIndex::Ndvi => &self.ndvi,
            VegetationIndex::Savi => &self.savi,
            VegetationIndex::Evi => &self.evi,
            VegetationIndex::Gndvi => &self.gndvi,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.ndvi.len()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.ndvi.dim()
    }

    pub fn summary(&self, index: VegetationIndex) -> IndexSummary {
        summarize(self.get(index))
    }

    pub fn to_report(&self) -> VegetationIndicesReport {
        VegetationIndicesReport {
            ndvi: self.summary(VegetationIndex::Ndvi),
            savi: self.summary(VegetationIndex::Savi),
            evi: self.summary(VegetationIndex::Evi),
            gndvi: self.summary(VegetationIndex::Gndvi),
            vegetation_coverage: self.vegetation_coverage_percent,
        }
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < DENOMINATOR_EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn ndvi(nir: f64, red: f64) -> f64 {
    sanitize(safe_ratio(nir - red, nir + red))
}

pub fn savi(nir: f64, red: f64) -> f64 {
    sanitize(safe_ratio(nir - red, nir + red + SOIL_BRIGHTNESS_L) * (1.0 + SOIL_BRIGHTNESS_L))
}

/// EVI, clamped to [-1, 1]
pub fn evi(nir: f64, red: f64, blue: f64) -> f64 {
    let value = 2.5 * safe_ratio(nir - red, nir + 6.0 * red - 7.5 * blue + 1.0);
    sanitize(value).clamp(-1.0, 1.0)
}

pub fn gndvi(nir: f64, green: f64) -> f64 {
    sanitize(safe_ratio(nir - green, nir + green))
}

/// Mean, population standard deviation, min and max of an index map.
/// Empty maps summarise to all zeros.
pub fn summarize(values: &Array2<f64>) -> IndexSummary {
    if values.is_empty() {
        return IndexSummary::default();
    }

    let n = values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Summation rounding can push the mean a hair outside [min, max]
    let mean = (values.sum() / n).clamp(min, max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    IndexSummary {
        mean,
        std: variance.sqrt(),
        min,
        max,
    }
}

fn at(band: &ArrayView2<f32>, idx: (usize, usize)) -> f64 {
    band[idx] as f64
}

/// Compute every vegetation index of a cube
pub fn compute_indices(cube: &SpectralCube) -> PipelineResult<VegetationIndexSet> {
    if cube.pixel_count() == 0 {
        return Err(PipelineError::EmptyCube);
    }

    let red = cube.band(cube.nearest_band(RED_NM));
    let nir = cube.band(cube.nearest_band(NIR_NM));
    let green = cube.band(cube.nearest_band(GREEN_NM));
    let blue = cube.band(cube.nearest_band(BLUE_NM));
    let shape = (cube.height(), cube.width());

    let ndvi_map = Array2::from_shape_fn(shape, |idx| ndvi(at(&nir, idx), at(&red, idx)));
    let savi_map = Array2::from_shape_fn(shape, |idx| savi(at(&nir, idx), at(&red, idx)));
    let evi_map = Array2::from_shape_fn(shape, |idx| {
        evi(at(&nir, idx), at(&red, idx), at(&blue, idx))
    });
    let gndvi_map = Array2::from_shape_fn(shape, |idx| gndvi(at(&nir, idx), at(&green, idx)));

    let vegetated = ndvi_map
        .iter()
        .filter(|&&v| v > VEGETATION_NDVI_THRESHOLD)
        .count();
    let vegetation_coverage_percent = vegetated as f64 / ndvi_map.len() as f64 * 100.0;

    Ok(VegetationIndexSet {
        ndvi: ndvi_map,
        savi: savi_map,
        evi: evi_map,
        gndvi: gndvi_map,
        vegetation_coverage_percent,
    })
}
