//! Batch processing report models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::AnalysisEnvelope;

/// Overall outcome of a batch run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item succeeded
    Success,
    /// At least one item failed and at least one succeeded
    PartialSuccess,
    /// Every item failed
    Error,
}

impl BatchStatus {
    pub fn from_counts(successful: usize, failed: usize) -> Self {
        match (successful, failed) {
            (_, 0) => BatchStatus::Success,
            (0, _) => BatchStatus::Error,
            _ => BatchStatus::PartialSuccess,
        }
    }
}

/// Result for one image of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: AnalysisEnvelope,
}

/// Aggregate counts and timings of a batch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub total_processing_time_secs: f64,
    pub average_time_per_image_secs: f64,
}

/// Report returned for a batch analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub batch_size: usize,
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_counts() {
        assert_eq!(BatchStatus::from_counts(3, 0), BatchStatus::Success);
        assert_eq!(BatchStatus::from_counts(2, 1), BatchStatus::PartialSuccess);
        assert_eq!(BatchStatus::from_counts(0, 2), BatchStatus::Error);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&BatchStatus::PartialSuccess).unwrap();
        assert_eq!(json, "\"partial_success\"");
    }
}
