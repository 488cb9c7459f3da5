//! RGB to hyperspectral band estimation
//!
//! Every pixel is expanded into `band_count` reflectance values by a linear
//! response per band over four pixel features: red, green, blue and an
//! excess-green vegetation signal `V = clamp(2G - R - B, 0, 1)`. The response
//! table comes from the active [`SpectralEstimationStrategy`]:
//!
//! - [`SyntheticEstimator`] builds it from a fixed basis. Visible bands are
//!   interpolated between anchors at 450 nm (blue), 550 nm (green) and 660 nm
//!   (red). A red edge between 680 and 750 nm rises into a near-infrared
//!   plateau driven mostly by `V`, which slowly declines to 1300 nm. The
//!   short-wave infrared decays towards 2500 nm with water absorption dips
//!   near 1450 nm and 1940 nm.
//! - [`NativeEngine`] interpolates a calibrated response model loaded from disk.
//!
//! Bounded multiplicative noise, smooth along the spectral axis, is then
//! applied per pixel from a seeded `StdRng`, and results are clamped to [0, 1].

use std::f64::consts::TAU;
use std::path::Path;

use ndarray::{Array3, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{validate_band_count, validate_wavelength_range, WavelengthRange};

use super::error::{PipelineError, PipelineResult};
use super::raster::RasterRgb;
use crate::external::NativeEngine;

/// Largest relative deviation the noise model may apply to a band
pub const MAX_NOISE_AMPLITUDE: f64 = 0.04;

const BLUE_ANCHOR_NM: f64 = 450.0;
const GREEN_ANCHOR_NM: f64 = 550.0;
const RED_ANCHOR_NM: f64 = 660.0;
const RED_EDGE_START_NM: f64 = 680.0;
const RED_EDGE_END_NM: f64 = 750.0;
const NIR_END_NM: f64 = 1300.0;
const SWIR_END_NM: f64 = 2500.0;

/// Linear response of one band to a pixel's features
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandResponse {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub vegetation: f64,
    pub bias: f64,
}

impl BandResponse {
    pub const RED: BandResponse = BandResponse::channel(1.0, 0.0, 0.0);
    pub const GREEN: BandResponse = BandResponse::channel(0.0, 1.0, 0.0);
    pub const BLUE: BandResponse = BandResponse::channel(0.0, 0.0, 1.0);

    /// Near-infrared plateau: strong vegetation response plus a brightness floor
    pub const NIR_PLATEAU: BandResponse = BandResponse {
        red: 0.1,
        green: 0.1,
        blue: 0.1,
        vegetation: 0.65,
        bias: 0.0,
    };

    const fn channel(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red,
            green,
            blue,
            vegetation: 0.0,
            bias: 0.0,
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            red: self.red * factor,
            green: self.green * factor,
            blue: self.blue * factor,
            vegetation: self.vegetation * factor,
            bias: self.bias * factor,
        }
    }

    /// `(1 - t)·a + t·b`
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            red: a.red + (b.red - a.red) * t,
            green: a.green + (b.green - a.green) * t,
            blue: a.blue + (b.blue - a.blue) * t,
            vegetation: a.vegetation + (b.vegetation - a.vegetation) * t,
            bias: a.bias + (b.bias - a.bias) * t,
        }
    }

    pub fn apply(&self, rgb: [f32; 3], vegetation: f64) -> f64 {
        self.red * rgb[0] as f64
            + self.green * rgb[1] as f64
            + self.blue * rgb[2] as f64
            + self.vegetation * vegetation
            + self.bias
    }
}

/// Excess-green vegetation signal of a pixel, in [0, 1]
pub fn vegetation_signal(rgb: [f32; 3]) -> f64 {
    let [r, g, b] = rgb.map(|c| c as f64);
    (2.0 * g - r - b).clamp(0.0, 1.0)
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn gaussian(x: f64, center: f64, width: f64) -> f64 {
    (-((x - center) / width).powi(2)).exp()
}

/// Fixed-basis estimator used when no calibrated engine is available
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticEstimator;

impl SyntheticEstimator {
    /// Response of the synthetic basis at `wavelength_nm`
    pub fn response_at(&self, wavelength_nm: f64) -> BandResponse {
        let nm = wavelength_nm;
        if nm <= BLUE_ANCHOR_NM {
            // Reflectance falls off into the near ultraviolet
            let t = ((nm - 350.0) / (BLUE_ANCHOR_NM - 350.0)).clamp(0.0, 1.0);
            BandResponse::BLUE.scale(0.6 + 0.4 * t)
        } else if nm <= GREEN_ANCHOR_NM {
            let t = smoothstep(BLUE_ANCHOR_NM, GREEN_ANCHOR_NM, nm);
            BandResponse::lerp(BandResponse::BLUE, BandResponse::GREEN, t)
        } else if nm <= RED_ANCHOR_NM {
            let t = smoothstep(GREEN_ANCHOR_NM, RED_ANCHOR_NM, nm);
            BandResponse::lerp(BandResponse::GREEN, BandResponse::RED, t)
        } else if nm <= RED_EDGE_START_NM {
            BandResponse::RED
        } else if nm <= RED_EDGE_END_NM {
            let t = smoothstep(RED_EDGE_START_NM, RED_EDGE_END_NM, nm);
            BandResponse::lerp(BandResponse::RED, BandResponse::NIR_PLATEAU, t)
        } else if nm <= NIR_END_NM {
            let t = (nm - RED_EDGE_END_NM) / (NIR_END_NM - RED_EDGE_END_NM);
            BandResponse::NIR_PLATEAU.scale(1.0 - 0.1 * t)
        } else {
            let t = ((nm - NIR_END_NM) / (SWIR_END_NM - NIR_END_NM)).clamp(0.0, 1.0);
            let decay = 0.9 - 0.55 * t;
            let absorption =
                1.0 - 0.5 * gaussian(nm, 1450.0, 40.0) - 0.6 * gaussian(nm, 1940.0, 50.0);
            BandResponse::NIR_PLATEAU.scale(decay * absorption)
        }
    }
}

/// How RGB pixels are expanded into spectra, chosen once at startup
#[derive(Debug, Clone)]
pub enum SpectralEstimationStrategy {
    Native(NativeEngine),
    Synthetic(SyntheticEstimator),
}

impl SpectralEstimationStrategy {
    /// Use the calibrated engine at `model_path` when it loads, otherwise
    /// fall back to the synthetic basis.
    pub fn probe(model_path: Option<&Path>) -> Self {
        let Some(path) = model_path else {
            tracing::info!("No spectral engine model configured, using synthetic estimator");
            return SpectralEstimationStrategy::Synthetic(SyntheticEstimator);
        };

        match NativeEngine::load(path) {
            Ok(engine) => {
                tracing::info!(
                    model = engine.model_name(),
                    control_points = engine.control_point_count(),
                    "Native spectral engine loaded"
                );
                SpectralEstimationStrategy::Native(engine)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Native spectral engine unavailable, using synthetic estimator"
                );
                SpectralEstimationStrategy::Synthetic(SyntheticEstimator)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpectralEstimationStrategy::Native(_) => "native",
            SpectralEstimationStrategy::Synthetic(_) => "synthetic",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, SpectralEstimationStrategy::Native(_))
    }

    pub fn response_at(&self, wavelength_nm: f64) -> BandResponse {
        match self {
            SpectralEstimationStrategy::Native(engine) => engine.response_at(wavelength_nm),
            SpectralEstimationStrategy::Synthetic(basis) => basis.response_at(wavelength_nm),
        }
    }
}

impl Default for SpectralEstimationStrategy {
    fn default() -> Self {
        SpectralEstimationStrategy::Synthetic(SyntheticEstimator)
    }
}

/// Height × width × band reflectance cube with its wavelength axis
#[derive(Debug, Clone)]
pub struct SpectralCube {
    data: Array3<f32>,
    wavelength_range: WavelengthRange,
    wavelengths: Vec<f64>,
}

impl SpectralCube {
    /// Wrap reflectance data whose third axis spans `wavelength_range`
    pub fn from_array(data: Array3<f32>, wavelength_range: WavelengthRange) -> PipelineResult<Self> {
        let band_count = data.dim().2;
        validate_band_count(band_count)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;
        validate_wavelength_range(&wavelength_range)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;

        let wavelengths = (0..band_count)
            .map(|i| wavelength_range.band_center(i, band_count))
            .collect();
        Ok(Self {
            data,
            wavelength_range,
            wavelengths,
        })
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().2
    }

    pub fn pixel_count(&self) -> usize {
        self.height() * self.width()
    }

    pub fn wavelength_range(&self) -> WavelengthRange {
        self.wavelength_range
    }

    /// Centre wavelength of each band, ascending
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Index of the band whose centre is closest to `wavelength_nm`
    pub fn nearest_band(&self, wavelength_nm: f64) -> usize {
        let span = self.wavelength_range.span();
        let last = self.band_count() - 1;
        if last == 0 || span <= 0.0 {
            return 0;
        }
        let position = (wavelength_nm - self.wavelength_range.min_nm) / span * last as f64;
        position.round().clamp(0.0, last as f64) as usize
    }

    /// 2-D view of one band
    pub fn band(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), index)
    }

    pub fn reflectance(&self, row: usize, col: usize, band: usize) -> f32 {
        self.data[[row, col, band]]
    }
}

/// Expands RGB rasters into spectral cubes using the selected strategy
#[derive(Debug, Clone, Default)]
pub struct SpectralBandEstimator {
    strategy: SpectralEstimationStrategy,
}

impl SpectralBandEstimator {
    pub fn new(strategy: SpectralEstimationStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &SpectralEstimationStrategy {
        &self.strategy
    }

    /// Estimate a `band_count`-band cube spanning `wavelength_range`.
    ///
    /// Pure function of its inputs: the same raster, parameters and seed
    /// always yield the same cube.
    pub fn estimate(
        &self,
        image: &RasterRgb,
        band_count: usize,
        wavelength_range: WavelengthRange,
        seed: u64,
    ) -> PipelineResult<SpectralCube> {
        validate_band_count(band_count)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;
        validate_wavelength_range(&wavelength_range)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;

        let (height, width) = (image.height(), image.width());
        if height == 0 || width == 0 {
            return Err(PipelineError::InvalidImage(
                "image has zero-sized dimensions".to_string(),
            ));
        }

        let wavelengths: Vec<f64> = (0..band_count)
            .map(|i| wavelength_range.band_center(i, band_count))
            .collect();
        let responses: Vec<BandResponse> = wavelengths
            .iter()
            .map(|&nm| self.strategy.response_at(nm))
            .collect();
        // Spectral position of each band in [0, 1], for the noise model
        let positions: Vec<f64> = wavelengths
            .iter()
            .map(|&nm| (nm - wavelength_range.min_nm) / wavelength_range.span())
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Array3::<f32>::zeros((height, width, band_count));

        for row in 0..height {
            for col in 0..width {
                let rgb = image.pixel(row, col);
                let vegetation = vegetation_signal(rgb);

                let amplitude = rng.random::<f64>() * MAX_NOISE_AMPLITUDE;
                let frequency = rng.random_range(1.0..3.0);
                let phase = rng.random::<f64>() * TAU;

                for (band, response) in responses.iter().enumerate() {
                    let noise = amplitude * (TAU * frequency * positions[band] + phase).sin();
                    let value = response.apply(rgb, vegetation) * (1.0 + noise);
                    data[[row, col, band]] = value.clamp(0.0, 1.0) as f32;
                }
            }
        }

        tracing::debug!(
            height,
            width,
            band_count,
            engine = self.strategy.name(),
            "Spectral cube estimated"
        );

        SpectralCube::from_array(data, wavelength_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> SpectralBandEstimator {
        SpectralBandEstimator::default()
    }

    #[test]
    fn test_zero_band_count_rejected() {
        let raster = RasterRgb::filled(2, 2, [0, 255, 0]).unwrap();
        let err = estimator()
            .estimate(&raster, 0, WavelengthRange::default(), 1)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let raster = RasterRgb::filled(2, 2, [0, 255, 0]).unwrap();
        let err = estimator()
            .estimate(&raster, 10, WavelengthRange::new(900.0, 400.0), 1)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    #[test]
    fn test_cube_shape_and_bounds() {
        let raster = RasterRgb::filled(3, 2, [200, 180, 30]).unwrap();
        let cube = estimator()
            .estimate(&raster, 424, WavelengthRange::default(), 7)
            .unwrap();

        assert_eq!(cube.height(), 2);
        assert_eq!(cube.width(), 3);
        assert_eq!(cube.band_count(), 424);
        for row in 0..2 {
            for col in 0..3 {
                for band in 0..424 {
                    let v = cube.reflectance(row, col, band);
                    assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_cube() {
        let raster = RasterRgb::filled(4, 4, [40, 160, 60]).unwrap();
        let a = estimator()
            .estimate(&raster, 64, WavelengthRange::default(), 99)
            .unwrap();
        let b = estimator()
            .estimate(&raster, 64, WavelengthRange::default(), 99)
            .unwrap();
        let c = estimator()
            .estimate(&raster, 64, WavelengthRange::default(), 100)
            .unwrap();

        assert_eq!(a.data, b.data);
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn test_black_pixels_stay_dark() {
        let raster = RasterRgb::filled(2, 2, [0, 0, 0]).unwrap();
        let cube = estimator()
            .estimate(&raster, 32, WavelengthRange::default(), 3)
            .unwrap();
        assert!(cube.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_vegetation_raises_near_infrared() {
        let raster = RasterRgb::filled(1, 1, [0, 255, 0]).unwrap();
        let cube = estimator()
            .estimate(&raster, 424, WavelengthRange::default(), 5)
            .unwrap();

        let red = cube.reflectance(0, 0, cube.nearest_band(660.0));
        let nir = cube.reflectance(0, 0, cube.nearest_band(800.0));
        assert!(nir > 0.6, "NIR reflectance too low: {}", nir);
        assert!(red < 0.05, "red reflectance too high: {}", red);
    }

    #[test]
    fn test_nearest_band_lookup() {
        let data = Array3::<f32>::zeros((1, 1, 5));
        let cube = SpectralCube::from_array(data, WavelengthRange::new(400.0, 800.0)).unwrap();

        assert_eq!(cube.nearest_band(400.0), 0);
        assert_eq!(cube.nearest_band(510.0), 1);
        assert_eq!(cube.nearest_band(660.0), 3);
        assert_eq!(cube.nearest_band(5000.0), 4);
        assert_eq!(cube.nearest_band(10.0), 0);
    }

    #[test]
    fn test_synthetic_water_absorption_dip() {
        let basis = SyntheticEstimator;
        let plateau = basis.response_at(1300.0).vegetation;
        let dip = basis.response_at(1450.0).vegetation;
        assert!(dip < plateau * 0.7);
    }

    fn bundled_model() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/spectral_engine.json")
    }

    #[test]
    fn test_selection_without_model_is_synthetic() {
        let strategy = SpectralEstimationStrategy::probe(None);
        assert!(!strategy.is_native());
        assert_eq!(strategy.name(), "synthetic");
    }

    #[test]
    fn test_selection_falls_back_when_model_missing() {
        let strategy =
            SpectralEstimationStrategy::probe(Some(Path::new("/nonexistent/spectral_engine.json")));
        assert!(!strategy.is_native());
    }

    #[test]
    fn test_selection_loads_bundled_model() {
        let strategy = SpectralEstimationStrategy::probe(Some(&bundled_model()));
        assert!(strategy.is_native());
        assert_eq!(strategy.name(), "native");
    }

    #[test]
    fn test_native_estimate_is_bounded_and_deterministic() {
        let strategy = SpectralEstimationStrategy::probe(Some(&bundled_model()));
        assert!(strategy.is_native());
        let estimator = SpectralBandEstimator::new(strategy);
        let raster = RasterRgb::filled(3, 3, [30, 220, 40]).unwrap();

        let a = estimator
            .estimate(&raster, 128, WavelengthRange::default(), 17)
            .unwrap();
        let b = estimator
            .estimate(&raster, 128, WavelengthRange::default(), 17)
            .unwrap();

        assert_eq!(a.data, b.data);
        assert!(a.data.iter().all(|v| (0.0..=1.0).contains(v)));
        let red = a.reflectance(1, 1, a.nearest_band(660.0));
        let nir = a.reflectance(1, 1, a.nearest_band(800.0));
        assert!(nir > red, "nir {} should exceed red {}", nir, red);
    }

    #[test]
    fn test_vegetation_signal() {
        assert_eq!(vegetation_signal([0.0, 1.0, 0.0]), 1.0);
        assert_eq!(vegetation_signal([1.0, 1.0, 1.0]), 0.0);
        assert_eq!(vegetation_signal([0.0, 0.0, 0.0]), 0.0);
    }
}
