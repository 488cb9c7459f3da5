//! Services of the Crop Health Hyperspectral Analysis backend

pub mod hyperspectral;
pub mod location;
pub mod worker_pool;

pub use hyperspectral::{BatchItem, HyperspectralService};
pub use location::{LocationProfileRegistry, LocationService};
pub use worker_pool::{ExhaustionPolicy, WorkerPool};
