//! Crop Health Hyperspectral Analysis - Backend
//!
//! Estimates a synthetic hyperspectral cube from an ordinary RGB field image,
//! derives vegetation indices, classifies crop health per pixel and returns
//! agronomic recommendations. Also predicts health for registered Indian
//! agricultural locations from their climate profile.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod analysis;
pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use analysis::{AnalysisOrchestrator, Clock, SpectralBandEstimator, SpectralEstimationStrategy, SystemClock};
use services::{HyperspectralService, LocationProfileRegistry, LocationService, WorkerPool};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hyperspectral: HyperspectralService,
    pub locations: LocationService,
}

impl AppState {
    /// Wire services from configuration using the given estimation strategy
    pub fn new(config: Config, strategy: SpectralEstimationStrategy) -> Self {
        Self::with_clock(config, strategy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: Config,
        strategy: SpectralEstimationStrategy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let orchestrator = AnalysisOrchestrator::with_clock(
            SpectralBandEstimator::new(strategy),
            Arc::clone(&clock),
        );
        let pool = WorkerPool::new(
            config.worker_pool.max_concurrent,
            config.worker_pool.exhaustion_policy,
        );
        let hyperspectral = HyperspectralService::new(
            Arc::new(orchestrator),
            pool,
            config.request_timeout(),
            config.analysis.max_image_dimension,
        );
        let locations =
            LocationService::with_clock(Arc::new(LocationProfileRegistry::builtin()), clock);

        Self {
            config: Arc::new(config),
            hyperspectral,
            locations,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes(&state.config))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Crop Health Hyperspectral Analysis API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
