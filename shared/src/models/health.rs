//! Crop health categories

use serde::{Deserialize, Serialize};

/// Composite score at or above which a pixel is Excellent
pub const EXCELLENT_THRESHOLD: f64 = 0.75;

/// Composite score at or above which a pixel is Good
pub const GOOD_THRESHOLD: f64 = 0.5;

/// Composite score at or above which a pixel is Fair
pub const FAIR_THRESHOLD: f64 = 0.25;

/// Discrete crop health category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// Composite score >= 0.75
    Excellent,
    /// Composite score >= 0.5
    Good,
    /// Composite score >= 0.25
    Fair,
    /// Anything below 0.25, including background pixels
    Poor,
}

impl HealthStatus {
    /// All categories, healthiest first
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Excellent,
        HealthStatus::Good,
        HealthStatus::Fair,
        HealthStatus::Poor,
    ];

    /// Position in [`HealthStatus::ALL`]
    pub fn index(self) -> usize {
        match self {
            HealthStatus::Excellent => 0,
            HealthStatus::Good => 1,
            HealthStatus::Fair => 2,
            HealthStatus::Poor => 3,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "Excellent"),
            HealthStatus::Good => write!(f, "Good"),
            HealthStatus::Fair => write!(f, "Fair"),
            HealthStatus::Poor => write!(f, "Poor"),
        }
    }
}

/// Map a composite health score onto a category
pub fn classify_health_score(score: f64) -> HealthStatus {
    if score >= EXCELLENT_THRESHOLD {
        HealthStatus::Excellent
    } else if score >= GOOD_THRESHOLD {
        HealthStatus::Good
    } else if score >= FAIR_THRESHOLD {
        HealthStatus::Fair
    } else {
        HealthStatus::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(classify_health_score(1.0), HealthStatus::Excellent);
        assert_eq!(classify_health_score(0.75), HealthStatus::Excellent);
        assert_eq!(classify_health_score(0.7499), HealthStatus::Good);
        assert_eq!(classify_health_score(0.5), HealthStatus::Good);
        assert_eq!(classify_health_score(0.25), HealthStatus::Fair);
        assert_eq!(classify_health_score(0.2499), HealthStatus::Poor);
        assert_eq!(classify_health_score(0.0), HealthStatus::Poor);
    }

    #[test]
    fn test_nan_score_is_poor() {
        assert_eq!(classify_health_score(f64::NAN), HealthStatus::Poor);
    }

    #[test]
    fn test_status_serializes_capitalized() {
        let json = serde_json::to_string(&HealthStatus::Excellent).unwrap();
        assert_eq!(json, "\"Excellent\"");
        for status in HealthStatus::ALL {
            assert_eq!(HealthStatus::ALL[status.index()], status);
        }
    }
}
