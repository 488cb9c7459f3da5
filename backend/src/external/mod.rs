//! External engine integrations

pub mod spectral_engine;

pub use spectral_engine::{EngineLoadError, NativeEngine};
