//! Shared types and models for the Crop Health Hyperspectral Analysis service
//!
//! This crate contains the serializable result envelopes, health categories,
//! location profiles and validation helpers used by the backend and by any
//! client that consumes the analysis API.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
