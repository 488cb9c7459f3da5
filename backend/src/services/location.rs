//! Agricultural location registry and climate-driven health prediction

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use shared::{
    AllLocationsPrediction, BatchStatus, ClassDistribution, Climate, FailedPrediction,
    GpsCoordinates, HealthStatus, LocationHealthMetrics, LocationPrediction, LocationProfile,
    PredictionSummary,
};

use crate::analysis::{Clock, PipelineError, PipelineResult, SystemClock};

/// Samples a location prediction is reported over
pub const PREDICTION_SAMPLES: u32 = 100;

// ============================================================================
// Registry
// ============================================================================

/// Read-only table of supported locations, keyed by name
#[derive(Debug, Clone)]
pub struct LocationProfileRegistry {
    profiles: BTreeMap<String, LocationProfile>,
}

fn profile(
    name: &str,
    state: &str,
    climate: Climate,
    latitude: Decimal,
    longitude: Decimal,
    crops: &[&str],
) -> LocationProfile {
    LocationProfile {
        name: name.to_string(),
        coordinates: GpsCoordinates::new(latitude, longitude),
        state: state.to_string(),
        climate,
        major_crops: crops.iter().map(|c| c.to_string()).collect(),
    }
}

impl LocationProfileRegistry {
    pub fn new(profiles: impl IntoIterator<Item = LocationProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// The five Indian agricultural regions the service ships with
    pub fn builtin() -> Self {
        Self::new([
            profile(
                "Anand",
                "Gujarat",
                Climate::SemiArid,
                Decimal::new(225645, 4),
                Decimal::new(729289, 4),
                &["Cotton", "Wheat", "Sugarcane", "Tobacco"],
            ),
            profile(
                "Jhagdia",
                "Gujarat",
                Climate::Humid,
                Decimal::new(217500, 4),
                Decimal::new(731500, 4),
                &["Rice", "Cotton", "Sugarcane", "Banana"],
            ),
            profile(
                "Kota",
                "Rajasthan",
                Climate::Arid,
                Decimal::new(252138, 4),
                Decimal::new(758648, 4),
                &["Wheat", "Soybean", "Mustard", "Coriander"],
            ),
            profile(
                "Maddur",
                "Karnataka",
                Climate::Tropical,
                Decimal::new(125847, 4),
                Decimal::new(770128, 4),
                &["Rice", "Ragi", "Coconut", "Areca nut"],
            ),
            profile(
                "Talala",
                "Gujarat",
                Climate::Coastal,
                Decimal::new(213500, 4),
                Decimal::new(703000, 4),
                &["Groundnut", "Cotton", "Mango", "Coconut"],
            ),
        ])
    }

    pub fn get(&self, name: &str) -> PipelineResult<&LocationProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| PipelineError::UnknownLocation(name.to_string()))
    }

    /// Location names in alphabetical order
    pub fn list(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &LocationProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for LocationProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// Range of plausible base health for a climate
pub fn climate_health_range(climate: Climate) -> (f64, f64) {
    match climate {
        Climate::Tropical => (0.70, 0.90),
        Climate::Humid => (0.65, 0.90),
        Climate::Coastal => (0.60, 0.90),
        Climate::SemiArid => (0.55, 0.85),
        Climate::Arid => (0.40, 0.80),
    }
}

/// Class distribution and dominant class for a base health score
pub fn class_distribution(health: f64) -> (ClassDistribution, HealthStatus) {
    let (parts, dominant) = if health > 0.8 {
        ([60, 30, 8, 2], HealthStatus::Excellent)
    } else if health > 0.6 {
        ([30, 50, 15, 5], HealthStatus::Good)
    } else if health > 0.4 {
        ([10, 30, 45, 15], HealthStatus::Fair)
    } else {
        ([5, 15, 35, 45], HealthStatus::Poor)
    };
    let [excellent, good, fair, poor] = parts;
    (
        ClassDistribution {
            excellent,
            good,
            fair,
            poor,
        },
        dominant,
    )
}

fn climate_recommendations(climate: Climate) -> [&'static str; 2] {
    match climate {
        Climate::Arid => [
            "Implement water-efficient irrigation systems for arid climate",
            "Consider drought-resistant crop varieties",
        ],
        Climate::Humid => [
            "Monitor for fungal diseases in humid conditions",
            "Ensure adequate drainage to prevent waterlogging",
        ],
        Climate::Tropical => [
            "Optimize for high rainfall tropical conditions",
            "Monitor for pest pressure in warm climate",
        ],
        Climate::SemiArid => [
            "Balance irrigation for semi-arid conditions",
            "Monitor soil moisture levels closely",
        ],
        Climate::Coastal => [
            "Account for salt spray effects in coastal areas",
            "Consider salt-tolerant varieties if needed",
        ],
    }
}

pub fn location_recommendations(location: &str, climate: Climate, health: f64) -> Vec<String> {
    let mut recommendations: Vec<String> = climate_recommendations(climate)
        .iter()
        .map(|s| s.to_string())
        .collect();

    recommendations.push(if health > 0.8 {
        format!("Excellent health in {} - maintain current practices", location)
    } else if health > 0.6 {
        format!("Good health in {} - minor optimizations suggested", location)
    } else {
        format!("Health concerns in {} - investigate stress factors", location)
    });
    recommendations
}

/// Derive a per-location seed so that locations do not share a draw
fn location_seed(seed: u64, name: &str) -> u64 {
    // FNV-1a over the name
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    });
    seed ^ hash
}

/// Predicts crop health for registered locations without imagery
#[derive(Clone)]
pub struct LocationService {
    registry: Arc<LocationProfileRegistry>,
    clock: Arc<dyn Clock>,
}

impl LocationService {
    pub fn new(registry: Arc<LocationProfileRegistry>) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: Arc<LocationProfileRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    pub fn registry(&self) -> &LocationProfileRegistry {
        &self.registry
    }

    /// Predict health for one location. Deterministic for a given seed.
    pub fn predict(&self, name: &str, seed: u64) -> PipelineResult<LocationPrediction> {
        let profile = self.registry.get(name)?;
        let mut rng = StdRng::seed_from_u64(location_seed(seed, name));

        let (low, high) = climate_health_range(profile.climate);
        let health = low + (high - low) * rng.random::<f64>();
        let (distribution, dominant_class) = class_distribution(health);

        tracing::debug!(
            location = %profile.name,
            climate = %profile.climate,
            health,
            "Location health predicted"
        );

        Ok(LocationPrediction {
            location: profile.name.clone(),
            coordinates: profile.coordinates.clone(),
            state: profile.state.clone(),
            climate: profile.climate,
            health_metrics: LocationHealthMetrics {
                overall_health_score: health,
                dominant_class,
                average_ndvi: 0.2 + 0.6 * health,
                samples_analyzed: PREDICTION_SAMPLES,
                class_distribution: distribution,
            },
            recommendations: location_recommendations(&profile.name, profile.climate, health),
            analysis_timestamp: self.clock.now(),
        })
    }

    /// Predict every registered location, collecting failures instead of aborting
    pub fn predict_all(&self, seed: u64) -> AllLocationsPrediction {
        let mut predictions = Vec::new();
        let mut failed_predictions = Vec::new();

        for name in self.registry.list() {
            match self.predict(&name, seed) {
                Ok(prediction) => predictions.push(prediction),
                Err(e) => {
                    tracing::warn!(location = %name, error = %e, "Location prediction failed");
                    failed_predictions.push(FailedPrediction {
                        location: name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = PredictionSummary {
            successful_predictions: predictions.len(),
            failed_predictions: failed_predictions.len(),
            total_locations: self.registry.len(),
        };

        AllLocationsPrediction {
            status: BatchStatus::from_counts(predictions.len(), failed_predictions.len()),
            predictions,
            failed_predictions,
            summary,
            timestamp: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = LocationProfileRegistry::builtin();
        assert_eq!(
            registry.list(),
            vec!["Anand", "Jhagdia", "Kota", "Maddur", "Talala"]
        );
        let kota = registry.get("Kota").unwrap();
        assert_eq!(kota.state, "Rajasthan");
        assert_eq!(kota.climate, Climate::Arid);
    }

    #[test]
    fn test_unknown_location() {
        let registry = LocationProfileRegistry::builtin();
        assert_eq!(
            registry.get("Atlantis").unwrap_err(),
            PipelineError::UnknownLocation("Atlantis".to_string())
        );
    }

    #[test]
    fn test_class_distribution_bands() {
        for health in [0.95, 0.7, 0.5, 0.2] {
            let (dist, _) = class_distribution(health);
            assert_eq!(dist.total(), 100);
        }
        assert_eq!(class_distribution(0.85).1, HealthStatus::Excellent);
        assert_eq!(class_distribution(0.8).1, HealthStatus::Good);
        assert_eq!(class_distribution(0.41).1, HealthStatus::Fair);
        assert_eq!(class_distribution(0.4).1, HealthStatus::Poor);
    }

    #[test]
    fn test_location_recommendations() {
        let recs = location_recommendations("Kota", Climate::Arid, 0.5);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("water-efficient irrigation"));
        assert_eq!(recs[2], "Health concerns in Kota - investigate stress factors");
    }

    #[test]
    fn test_location_seeds_differ() {
        assert_ne!(location_seed(42, "Anand"), location_seed(42, "Kota"));
        assert_eq!(location_seed(42, "Anand"), location_seed(42, "Anand"));
    }
}
