//! HTTP handlers for location endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{AllLocationsPrediction, LocationPrediction, LocationProfile};

use super::hyperspectral::parse_seed;
use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SeedQuery {
    /// A number, or `random` for a fresh seed
    pub seed: Option<String>,
}

#[derive(Serialize)]
pub struct LocationsResponse {
    pub status: &'static str,
    pub locations: Vec<LocationProfile>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct PredictionResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub prediction: LocationPrediction,
}

/// List supported locations
pub async fn list_locations(State(state): State<AppState>) -> Json<LocationsResponse> {
    let locations: Vec<LocationProfile> = state.locations.registry().profiles().cloned().collect();
    Json(LocationsResponse {
        status: "success",
        count: locations.len(),
        locations,
    })
}

/// Predict crop health for one location
pub async fn predict_location(
    State(state): State<AppState>,
    Path(location): Path<String>,
    Query(query): Query<SeedQuery>,
) -> AppResult<Json<PredictionResponse>> {
    let seed = parse_seed(query.seed.as_deref(), state.config.analysis.default_seed)?;
    let prediction = state.locations.predict(&location, seed)?;
    Ok(Json(PredictionResponse {
        status: "success",
        prediction,
    }))
}

/// Predict crop health for every supported location
pub async fn predict_all_locations(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
) -> AppResult<Json<AllLocationsPrediction>> {
    let seed = parse_seed(query.seed.as_deref(), state.config.analysis.default_seed)?;
    Ok(Json(state.locations.predict_all(seed)))
}
