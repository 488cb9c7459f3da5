//! Rule-based agronomic recommendations
//!
//! Rules are evaluated in a fixed order and every match appends its advice:
//!
//! 1. advice for the dominant health status
//! 2. low vegetation coverage
//! 3. a large share of poor-health pixels
//! 4. low or high mean NDVI
//! 5. general monitoring advice, always present

use shared::HealthStatus;

use super::classifier::HealthClassification;
use super::indices::{VegetationIndex, VegetationIndexSet};

/// Coverage percentage below which irrigation and soil advice is given
pub const LOW_COVERAGE_PERCENT: f64 = 30.0;

/// Poor-pixel percentage at or above which field inspection is advised
pub const HIGH_POOR_PERCENT: f64 = 25.0;

pub const LOW_VIGOR_NDVI: f64 = 0.3;
pub const HIGH_VIGOR_NDVI: f64 = 0.8;

const GENERAL_ADVICE: [&str; 2] = [
    "Continue regular monitoring using hyperspectral analysis",
    "Implement precision agriculture practices based on spatial variability",
];

fn status_advice(status: HealthStatus) -> &'static [&'static str] {
    match status {
        HealthStatus::Excellent => &[
            "Excellent crop health detected - continue current management practices",
            "Monitor for any early signs of pest or disease pressure",
        ],
        HealthStatus::Good => &[
            "Good crop health - consider optimizing nutrition for better growth",
            "Monitor water stress indicators regularly",
        ],
        HealthStatus::Fair => &[
            "Fair crop health - investigate potential stress factors",
            "Consider soil testing and nutrient management",
            "Check irrigation scheduling and water availability",
        ],
        HealthStatus::Poor => &[
            "Poor crop health detected - immediate action required",
            "Conduct thorough field inspection for pests and diseases",
            "Review irrigation, nutrition, and soil management practices",
        ],
    }
}

/// Build the ordered recommendation list. Never empty.
pub fn recommend(classification: &HealthClassification, indices: &VegetationIndexSet) -> Vec<String> {
    let mut recommendations: Vec<String> = status_advice(classification.dominant_status)
        .iter()
        .map(|s| s.to_string())
        .collect();

    if indices.vegetation_coverage_percent < LOW_COVERAGE_PERCENT {
        recommendations.push(format!(
            "Low vegetation coverage ({:.1}%) - review irrigation and soil preparation",
            indices.vegetation_coverage_percent
        ));
    }

    let poor_percent = classification.percent(HealthStatus::Poor);
    if poor_percent >= HIGH_POOR_PERCENT {
        recommendations.push(format!(
            "{:.1}% of the field shows poor health - inspect affected zones for disease and pest damage",
            poor_percent
        ));
    }

    let ndvi_mean = indices.summary(VegetationIndex::Ndvi).mean;
    if ndvi_mean < LOW_VIGOR_NDVI {
        recommendations.push("Low vegetation vigor detected - consider fertilization".to_string());
    } else if ndvi_mean > HIGH_VIGOR_NDVI {
        recommendations
            .push("High vegetation vigor - monitor for optimal harvest timing".to_string());
    }

    recommendations.extend(GENERAL_ADVICE.iter().map(|s| s.to_string()));
    recommendations
}
