//! Per-pixel crop health classification

use ndarray::{Array2, Zip};
use shared::{classify_health_score, HealthAnalysis, HealthStatus};

use super::error::{PipelineError, PipelineResult};
use super::indices::VegetationIndexSet;

pub const NDVI_WEIGHT: f64 = 0.5;
pub const SAVI_WEIGHT: f64 = 0.3;
pub const EVI_WEIGHT: f64 = 0.2;

/// Weighted composite of the normalised indices. Negative index values denote
/// non-vegetation and contribute nothing.
pub fn composite_score(ndvi: f64, savi: f64, evi: f64) -> f64 {
    let n = |x: f64| x.clamp(0.0, 1.0);
    NDVI_WEIGHT * n(ndvi) + SAVI_WEIGHT * n(savi) + EVI_WEIGHT * n(evi)
}

#[derive(Debug, Clone)]
pub struct HealthClassification {
    pixel_status: Array2<HealthStatus>,
    /// Pixel counts in [`HealthStatus::ALL`] order
    counts: [usize; 4],
    pub dominant_status: HealthStatus,
    pub confidence: f64,
    pub overall_health_score: f64,
}

impl HealthClassification {
    pub fn pixel_count(&self) -> usize {
        self.pixel_status.len()
    }

    pub fn count(&self, status: HealthStatus) -> usize {
        self.counts[status.index()]
    }

    /// Share of pixels in `status`, 0-100
    pub fn percent(&self, status: HealthStatus) -> f64 {
        self.count(status) as f64 / self.pixel_count() as f64 * 100.0
    }

    pub fn status_at(&self, row: usize, col: usize) -> Option<HealthStatus> {
        self.pixel_status.get((row, col)).copied()
    }

    pub fn to_report(&self) -> HealthAnalysis {
        HealthAnalysis {
            overall_health_score: self.overall_health_score,
            dominant_health_status: self.dominant_status,
            confidence: self.confidence,
            excellent_percent: self.percent(HealthStatus::Excellent),
            good_percent: self.percent(HealthStatus::Good),
            fair_percent: self.percent(HealthStatus::Fair),
            poor_percent: self.percent(HealthStatus::Poor),
            pixels_analyzed: self.pixel_count(),
        }
    }
}

/// Classify every pixel of an index set
pub fn classify(indices: &VegetationIndexSet) -> PipelineResult<HealthClassification> {
    let dims = indices.dim();
    if indices.pixel_count() == 0
        || indices.savi.dim() != dims
        || indices.evi.dim() != dims
    {
        return Err(PipelineError::InsufficientData);
    }

    let scores = Zip::from(&indices.ndvi)
        .and(&indices.savi)
        .and(&indices.evi)
        .map_collect(|&ndvi, &savi, &evi| composite_score(ndvi, savi, evi));
    let pixel_status = scores.mapv(classify_health_score);

    let mut counts = [0usize; 4];
    for status in pixel_status.iter() {
        counts[status.index()] += 1;
    }

    // Iterating healthiest first with >= lets ties settle on the less healthy class
    let mut dominant_status = HealthStatus::Excellent;
    for status in HealthStatus::ALL {
        if counts[status.index()] >= counts[dominant_status.index()] {
            dominant_status = status;
        }
    }

    let total = pixel_status.len() as f64;
    let confidence = counts[dominant_status.index()] as f64 / total;
    let overall_health_score = (scores.sum() / total).clamp(0.0, 1.0);

    Ok(HealthClassification {
        pixel_status,
        counts,
        dominant_status,
        confidence,
        overall_health_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_set(ndvi: Vec<f64>, savi: Vec<f64>, evi: Vec<f64>) -> VegetationIndexSet {
        let n = ndvi.len();
        let shape = (1, n);
        let gndvi = Array2::zeros(shape);
        VegetationIndexSet {
            ndvi: Array2::from_shape_vec(shape, ndvi).unwrap(),
            savi: Array2::from_shape_vec(shape, savi).unwrap(),
            evi: Array2::from_shape_vec(shape, evi).unwrap(),
            gndvi,
            vegetation_coverage_percent: 0.0,
        }
    }

    #[test]
    fn test_composite_weights() {
        assert_eq!(composite_score(1.0, 1.0, 1.0), 1.0);
        assert_eq!(composite_score(-1.0, -0.5, -1.0), 0.0);
        assert!((composite_score(0.8, 0.5, 0.5) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_classify_counts_and_percentages() {
        let set = index_set(
            vec![0.9, 0.9, 0.6, 0.0],
            vec![0.9, 0.9, 0.6, 0.0],
            vec![0.9, 0.9, 0.6, 0.0],
        );
        let c = classify(&set).unwrap();

        assert_eq!(c.count(HealthStatus::Excellent), 2);
        assert_eq!(c.count(HealthStatus::Good), 1);
        assert_eq!(c.count(HealthStatus::Poor), 1);
        assert_eq!(c.dominant_status, HealthStatus::Excellent);
        assert_eq!(c.confidence, 0.5);

        let report = c.to_report();
        assert_eq!(report.excellent_percent, 50.0);
        assert_eq!(report.pixels_analyzed, 4);
        assert!((report.percent_total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_resolves_to_less_healthy() {
        let set = index_set(vec![0.9, 0.0], vec![0.9, 0.0], vec![0.9, 0.0]);
        let c = classify(&set).unwrap();
        assert_eq!(c.dominant_status, HealthStatus::Poor);
        assert_eq!(c.confidence, 0.5);
    }

    #[test]
    fn test_empty_indices_rejected() {
        let set = index_set(vec![], vec![], vec![]);
        assert_eq!(classify(&set).unwrap_err(), PipelineError::InsufficientData);
    }

    #[test]
    fn test_status_lookup() {
        let set = index_set(vec![0.0, 0.9], vec![0.0, 0.9], vec![0.0, 0.9]);
        let c = classify(&set).unwrap();
        assert_eq!(c.status_at(0, 0), Some(HealthStatus::Poor));
        assert_eq!(c.status_at(0, 1), Some(HealthStatus::Excellent));
        assert_eq!(c.status_at(5, 5), None);
    }
}
