//! Route definitions for the Crop Health Hyperspectral Analysis service

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{config::Config, handlers, AppState};

/// Multipart framing and base64 inflation on top of the raw image size
fn single_upload_limit(config: &Config) -> usize {
    config.max_upload_bytes() / 3 * 4 + 64 * 1024
}

/// Create API routes
pub fn api_routes(config: &Config) -> Router<AppState> {
    Router::new().nest("/hyperspectral", hyperspectral_routes(config))
}

/// Hyperspectral analysis routes
fn hyperspectral_routes(config: &Config) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/analysis-summary", get(handlers::analysis_summary))
        .route("/locations", get(handlers::list_locations))
        .route("/predict-location/:location", get(handlers::predict_location))
        .route("/predict-all-locations", get(handlers::predict_all_locations))
        .route(
            "/process-image",
            post(handlers::process_image).layer(DefaultBodyLimit::max(single_upload_limit(config))),
        )
        .route(
            "/batch-process",
            post(handlers::batch_process)
                .layer(DefaultBodyLimit::max(config.max_batch_upload_bytes())),
        )
}
