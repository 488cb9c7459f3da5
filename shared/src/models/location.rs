//! Agricultural location models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// Broad climate zone of a region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Climate {
    Tropical,
    Humid,
    Coastal,
    #[serde(rename = "Semi-arid")]
    SemiArid,
    Arid,
}

impl std::fmt::Display for Climate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Climate::Tropical => write!(f, "Tropical"),
            Climate::Humid => write!(f, "Humid"),
            Climate::Coastal => write!(f, "Coastal"),
            Climate::SemiArid => write!(f, "Semi-arid"),
            Climate::Arid => write!(f, "Arid"),
        }
    }
}

/// A named agricultural region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationProfile {
    pub name: String,
    pub coordinates: GpsCoordinates,
    pub state: String,
    pub climate: Climate,
    pub major_crops: Vec<String>,
}

/// Share of samples per health category, in whole percent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ClassDistribution {
    pub excellent: u32,
    pub good: u32,
    pub fair: u32,
    pub poor: u32,
}

impl ClassDistribution {
    pub fn total(&self) -> u32 {
        self.excellent + self.good + self.fair + self.poor
    }
}

/// Health prediction for a location when no image is supplied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationPrediction {
    pub location: String,
    pub coordinates: GpsCoordinates,
    pub state: String,
    pub climate: Climate,
    pub health_metrics: LocationHealthMetrics,
    pub recommendations: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
}

/// Aggregate health metrics for a location prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationHealthMetrics {
    pub overall_health_score: f64,
    pub dominant_class: super::HealthStatus,
    pub average_ndvi: f64,
    pub samples_analyzed: u32,
    pub class_distribution: ClassDistribution,
}

/// A location whose prediction could not be produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedPrediction {
    pub location: String,
    pub error: String,
}

/// Predictions for every registered location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllLocationsPrediction {
    pub status: super::BatchStatus,
    pub predictions: Vec<LocationPrediction>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed_predictions: Vec<FailedPrediction>,
    pub summary: PredictionSummary,
    pub timestamp: DateTime<Utc>,
}

/// Counts for an all-locations prediction run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionSummary {
    pub successful_predictions: usize,
    pub failed_predictions: usize,
    pub total_locations: usize,
}
