//! Configuration management for the Crop Health Hyperspectral Analysis service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CHS__ prefix (e.g. CHS__SERVER__PORT)

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{WavelengthRange, DEFAULT_BAND_COUNT, DEFAULT_WAVELENGTH_MAX_NM, DEFAULT_WAVELENGTH_MIN_NM};

use crate::analysis::{AnalysisOptions, DEFAULT_MAX_DIMENSION, DEFAULT_SEED};
use crate::services::ExhaustionPolicy;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Analysis defaults and upload limits
    pub analysis: AnalysisConfig,

    /// Concurrency limits for analysis work
    pub worker_pool: WorkerPoolConfig,

    /// Spectral engine selection
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Spectral bands estimated per image
    pub band_count: usize,

    /// Lower wavelength bound in nanometres
    pub wavelength_min: f64,

    /// Upper wavelength bound in nanometres
    pub wavelength_max: f64,

    /// Noise seed used when a request does not supply one
    pub default_seed: u64,

    /// Longest image side analysed; larger images are downsampled
    pub max_image_dimension: u32,

    /// Upload limit for a single image, in megabytes
    pub max_upload_mb: usize,

    /// Upload limit for a whole batch request, in megabytes
    pub max_batch_upload_mb: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerPoolConfig {
    /// Analyses allowed to run at once
    pub max_concurrent: usize,

    /// Behaviour when every slot is busy (queue, reject)
    pub exhaustion_policy: ExhaustionPolicy,

    /// Time limit for one image analysis
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// Calibrated spectral response model; synthetic estimation is used when unset
    pub model_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CHS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("analysis.band_count", DEFAULT_BAND_COUNT as i64)?
            .set_default("analysis.wavelength_min", DEFAULT_WAVELENGTH_MIN_NM)?
            .set_default("analysis.wavelength_max", DEFAULT_WAVELENGTH_MAX_NM)?
            .set_default("analysis.default_seed", DEFAULT_SEED as i64)?
            .set_default("analysis.max_image_dimension", DEFAULT_MAX_DIMENSION as i64)?
            .set_default("analysis.max_upload_mb", 16)?
            .set_default("analysis.max_batch_upload_mb", 64)?
            .set_default("worker_pool.max_concurrent", 10)?
            .set_default("worker_pool.exhaustion_policy", "queue")?
            .set_default("worker_pool.request_timeout_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CHS__ prefix)
            .add_source(
                Environment::with_prefix("CHS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Analysis parameters applied when a request does not override them
    pub fn default_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            band_count: self.analysis.band_count,
            wavelength_range: WavelengthRange::new(
                self.analysis.wavelength_min,
                self.analysis.wavelength_max,
            ),
            seed: self.analysis.default_seed,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_pool.request_timeout_secs.max(1))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.analysis.max_upload_mb * 1024 * 1024
    }

    pub fn max_batch_upload_bytes(&self) -> usize {
        self.analysis.max_batch_upload_mb * 1024 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            analysis: AnalysisConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            band_count: DEFAULT_BAND_COUNT,
            wavelength_min: DEFAULT_WAVELENGTH_MIN_NM,
            wavelength_max: DEFAULT_WAVELENGTH_MAX_NM,
            default_seed: DEFAULT_SEED,
            max_image_dimension: DEFAULT_MAX_DIMENSION,
            max_upload_mb: 16,
            max_batch_upload_mb: 64,
        }
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            exhaustion_policy: ExhaustionPolicy::Queue,
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let config = Config::default();
        assert_eq!(config.default_options(), AnalysisOptions::default());
        assert_eq!(config.max_upload_bytes(), 16 * 1024 * 1024);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.engine.model_path.is_none());
    }
}
