//! Domain models for the Crop Health Hyperspectral Analysis service

mod analysis;
mod batch;
mod health;
mod location;

pub use analysis::*;
pub use batch::*;
pub use health::*;
pub use location::*;
