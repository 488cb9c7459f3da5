//! Service status and capability handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{HealthStatus, ALLOWED_IMAGE_EXTENSIONS};

use crate::analysis::{SpectralEstimationStrategy, VegetationIndex};
use crate::services::ExhaustionPolicy;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub estimation_engine: String,
    pub native_engine_available: bool,
    pub supported_locations: Vec<String>,
    pub worker_pool: WorkerPoolStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct WorkerPoolStatus {
    pub max_concurrent: usize,
    pub available: usize,
    pub exhaustion_policy: ExhaustionPolicy,
}

/// Calibrated model behind the native engine
#[derive(Serialize)]
pub struct EngineModelInfo {
    pub name: String,
    pub version: Option<String>,
    pub control_points: usize,
}

impl EngineModelInfo {
    fn from_strategy(strategy: &SpectralEstimationStrategy) -> Option<Self> {
        match strategy {
            SpectralEstimationStrategy::Native(engine) => Some(Self {
                name: engine.model_name().to_string(),
                version: engine.model_version().map(str::to_string),
                control_points: engine.control_point_count(),
            }),
            SpectralEstimationStrategy::Synthetic(_) => None,
        }
    }
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let strategy = state.hyperspectral.strategy();
    let pool = state.hyperspectral.pool();

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Hyperspectral Crop Health Analysis".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        estimation_engine: strategy.name().to_string(),
        native_engine_available: strategy.is_native(),
        supported_locations: state.locations.registry().list(),
        worker_pool: WorkerPoolStatus {
            max_concurrent: pool.max_concurrent(),
            available: pool.available(),
            exhaustion_policy: pool.policy(),
        },
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
pub struct AnalysisSummary {
    pub service: String,
    pub version: String,
    pub estimation_engine: String,
    /// Present only when the native engine is loaded
    pub engine_model: Option<EngineModelInfo>,
    pub capabilities: Capabilities,
    pub supported_regions: SupportedRegions,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct Capabilities {
    pub vegetation_indices: Vec<&'static str>,
    pub health_classification: Vec<String>,
    pub spectral_bands: usize,
    pub wavelength_range: [f64; 2],
    pub supported_file_formats: Vec<&'static str>,
    pub max_image_dimension: u32,
    pub max_upload_mb: usize,
    pub max_batch_upload_mb: usize,
    pub max_concurrent_analyses: usize,
}

#[derive(Serialize)]
pub struct SupportedRegions {
    pub country: String,
    pub locations: Vec<String>,
    pub climates: Vec<String>,
    pub states: Vec<String>,
}

/// Capabilities of the analysis service
pub async fn analysis_summary(State(state): State<AppState>) -> Json<AnalysisSummary> {
    let config = &state.config;
    let defaults = config.default_options();
    let registry = state.locations.registry();

    let mut climates: Vec<String> = registry.profiles().map(|p| p.climate.to_string()).collect();
    climates.sort();
    climates.dedup();
    let mut states: Vec<String> = registry.profiles().map(|p| p.state.clone()).collect();
    states.sort();
    states.dedup();

    Json(AnalysisSummary {
        service: "Hyperspectral Crop Health Analysis".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        estimation_engine: state.hyperspectral.engine_name().to_string(),
        engine_model: EngineModelInfo::from_strategy(state.hyperspectral.strategy()),
        capabilities: Capabilities {
            vegetation_indices: VegetationIndex::ALL.iter().map(|i| i.name()).collect(),
            health_classification: HealthStatus::ALL.iter().map(|s| s.to_string()).collect(),
            spectral_bands: defaults.band_count,
            wavelength_range: [defaults.wavelength_range.min_nm, defaults.wavelength_range.max_nm],
            supported_file_formats: ALLOWED_IMAGE_EXTENSIONS.to_vec(),
            max_image_dimension: state.hyperspectral.max_dimension(),
            max_upload_mb: config.analysis.max_upload_mb,
            max_batch_upload_mb: config.analysis.max_batch_upload_mb,
            max_concurrent_analyses: state.hyperspectral.pool().max_concurrent(),
        },
        supported_regions: SupportedRegions {
            country: "India".to_string(),
            locations: registry.list(),
            climates,
            states,
        },
        timestamp: Utc::now(),
    })
}
