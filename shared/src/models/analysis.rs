//! Hyperspectral analysis result models
//!
//! These types define the JSON envelope returned to API callers. Field names
//! are part of the public contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::health::HealthStatus;
use crate::types::WavelengthRange;

/// Summary statistics of one vegetation index over all pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Vegetation index section of the envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VegetationIndicesReport {
    pub ndvi: IndexSummary,
    pub savi: IndexSummary,
    pub evi: IndexSummary,
    pub gndvi: IndexSummary,
    /// Percentage (0-100) of pixels whose NDVI exceeds the vegetation threshold
    pub vegetation_coverage: f64,
}

/// Health classification section of the envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthAnalysis {
    /// Mean composite score, 0-1
    pub overall_health_score: f64,
    pub dominant_health_status: HealthStatus,
    /// Fraction of pixels agreeing with the dominant status, 0-1
    pub confidence: f64,
    pub excellent_percent: f64,
    pub good_percent: f64,
    pub fair_percent: f64,
    pub poor_percent: f64,
    pub pixels_analyzed: usize,
}

impl HealthAnalysis {
    /// Sum of the four category percentages (100 for any non-empty classification)
    pub fn percent_total(&self) -> f64 {
        self.excellent_percent + self.good_percent + self.fair_percent + self.poor_percent
    }
}

/// Completed analysis of a single image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub vegetation_indices: VegetationIndicesReport,
    pub health_analysis: HealthAnalysis,
    pub hyperspectral_bands: usize,
    pub wavelength_range: WavelengthRange,
    pub recommendations: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
    /// Seed that drove the spectral noise model; replaying it reproduces the result
    pub seed: u64,
    /// Name of the spectral estimation engine that produced the cube
    pub estimation_engine: String,
}

/// Body of an error envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisError {
    /// Pipeline stage (or request phase) that failed
    pub stage: String,
    /// Machine-readable error code
    pub code: String,
    pub message: String,
}

/// Uniform envelope: `{"status": "success", ...}` or `{"status": "error", ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisEnvelope {
    Success(AnalysisResult),
    Error(AnalysisError),
}

impl AnalysisEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisEnvelope::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> AnalysisResult {
        let summary = IndexSummary {
            mean: 0.5,
            std: 0.1,
            min: 0.2,
            max: 0.8,
        };
        AnalysisResult {
            vegetation_indices: VegetationIndicesReport {
                ndvi: summary,
                savi: summary,
                evi: summary,
                gndvi: summary,
                vegetation_coverage: 75.0,
            },
            health_analysis: HealthAnalysis {
                overall_health_score: 0.6,
                dominant_health_status: HealthStatus::Good,
                confidence: 0.7,
                excellent_percent: 10.0,
                good_percent: 70.0,
                fair_percent: 15.0,
                poor_percent: 5.0,
                pixels_analyzed: 100,
            },
            hyperspectral_bands: 424,
            wavelength_range: WavelengthRange::default(),
            recommendations: vec!["Keep monitoring".to_string()],
            analysis_timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            seed: 42,
            estimation_engine: "synthetic".to_string(),
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let value = serde_json::to_value(AnalysisEnvelope::Success(sample_result())).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["hyperspectral_bands"], 424);
        assert_eq!(value["wavelength_range"][0], 381.45);
        assert_eq!(value["vegetation_indices"]["ndvi"]["mean"], 0.5);
        assert_eq!(value["vegetation_indices"]["vegetation_coverage"], 75.0);
        assert_eq!(value["health_analysis"]["dominant_health_status"], "Good");
        assert_eq!(value["analysis_timestamp"], "2024-06-01T12:00:00Z");
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = AnalysisEnvelope::Error(AnalysisError {
            stage: "estimating".to_string(),
            code: "INVALID_PARAMETER".to_string(),
            message: "band_count must be greater than zero".to_string(),
        });
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["stage"], "estimating");
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_percent_total() {
        assert!((sample_result().health_analysis.percent_total() - 100.0).abs() < 1e-9);
    }
}
