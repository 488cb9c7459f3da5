//! Hyperspectral crop health analysis pipeline
//!
//! RGB raster → spectral cube → vegetation indices → health classification →
//! recommendations, composed by [`AnalysisOrchestrator`].

pub mod classifier;
pub mod error;
pub mod indices;
pub mod orchestrator;
pub mod raster;
pub mod recommendations;
pub mod spectral;

pub use classifier::{classify, HealthClassification};
pub use error::{PipelineError, PipelineResult};
pub use indices::{compute_indices, VegetationIndex, VegetationIndexSet};
pub use orchestrator::{
    AnalysisFailure, AnalysisOptions, AnalysisOrchestrator, AnalysisStage, Clock, FixedClock,
    RunControl, SystemClock, DEFAULT_SEED,
};
pub use raster::{decode_image, RasterRgb, DEFAULT_MAX_DIMENSION};
pub use recommendations::recommend;
pub use spectral::{
    SpectralBandEstimator, SpectralCube, SpectralEstimationStrategy, SyntheticEstimator,
};
