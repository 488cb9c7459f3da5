//! HTTP handlers

pub mod health;
pub mod hyperspectral;
pub mod location;

pub use health::{analysis_summary, health_check};
pub use hyperspectral::{batch_process, process_image};
pub use location::{list_locations, predict_all_locations, predict_location};
