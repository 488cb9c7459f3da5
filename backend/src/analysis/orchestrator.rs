//! Analysis orchestration
//!
//! Runs estimation, index computation, classification and recommendation in
//! sequence, tracking the current stage so that any failure is reported once,
//! attributed to the stage that raised it. A deadline, when supplied, is
//! checked before each stage; the pipeline stops without partial results once
//! it has passed.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use shared::{
    validate_band_count, validate_wavelength_range, AnalysisError, AnalysisResult,
    WavelengthRange, DEFAULT_BAND_COUNT,
};
use thiserror::Error;

use super::classifier::classify;
use super::error::PipelineError;
use super::indices::compute_indices;
use super::raster::{decode_image, RasterRgb};
use super::recommendations::recommend;
use super::spectral::{SpectralBandEstimator, SpectralEstimationStrategy};

/// Seed used when a request does not supply one
pub const DEFAULT_SEED: u64 = 42;

/// Per-request analysis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub band_count: usize,
    pub wavelength_range: WavelengthRange,
    pub seed: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            band_count: DEFAULT_BAND_COUNT,
            wavelength_range: WavelengthRange::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        validate_band_count(self.band_count)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;
        validate_wavelength_range(&self.wavelength_range)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnalysisStage {
    Pending = 0,
    Estimating = 1,
    IndexComputation = 2,
    Classifying = 3,
    Recommending = 4,
    Completed = 5,
    Failed = 6,
}

impl AnalysisStage {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStage::Pending => "pending",
            AnalysisStage::Estimating => "estimating",
            AnalysisStage::IndexComputation => "index_computation",
            AnalysisStage::Classifying => "classifying",
            AnalysisStage::Recommending => "recommending",
            AnalysisStage::Completed => "completed",
            AnalysisStage::Failed => "failed",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => AnalysisStage::Pending,
            1 => AnalysisStage::Estimating,
            2 => AnalysisStage::IndexComputation,
            3 => AnalysisStage::Classifying,
            4 => AnalysisStage::Recommending,
            5 => AnalysisStage::Completed,
            _ => AnalysisStage::Failed,
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline error together with the stage it occurred in
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} failed: {error}")]
pub struct AnalysisFailure {
    pub stage: AnalysisStage,
    pub error: PipelineError,
}

impl AnalysisFailure {
    pub fn new(stage: AnalysisStage, error: PipelineError) -> Self {
        Self { stage, error }
    }

    /// Body of the error envelope
    pub fn to_error_envelope(&self) -> AnalysisError {
        AnalysisError {
            stage: self.stage.to_string(),
            code: self.error.code().to_string(),
            message: self.error.to_string(),
        }
    }
}

/// Source of analysis timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Deadline and progress handle for one analysis run.
///
/// Cloning shares the progress cell, so a supervisor holding a clone can see
/// which stage a run had reached when it gave up waiting.
#[derive(Debug, Clone)]
pub struct RunControl {
    deadline: Option<Instant>,
    progress: Arc<AtomicU8>,
}

impl RunControl {
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            progress: Arc::new(AtomicU8::new(AnalysisStage::Pending as u8)),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::unbounded()
        }
    }

    /// Last stage the run entered
    pub fn stage(&self) -> AnalysisStage {
        AnalysisStage::from_u8(self.progress.load(Ordering::Acquire))
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn record(&self, stage: AnalysisStage) {
        self.progress.store(stage as u8, Ordering::Release);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::unbounded()
    }
}

struct StageTracker<'a> {
    current: AnalysisStage,
    control: &'a RunControl,
}

impl<'a> StageTracker<'a> {
    fn new(control: &'a RunControl) -> Self {
        control.record(AnalysisStage::Pending);
        Self {
            current: AnalysisStage::Pending,
            control,
        }
    }

    fn enter(&mut self, next: AnalysisStage) -> Result<(), AnalysisFailure> {
        if self.control.expired() {
            self.control.record(AnalysisStage::Failed);
            return Err(AnalysisFailure::new(next, PipelineError::Timeout));
        }
        self.current = next;
        self.control.record(next);
        Ok(())
    }

    fn fail(&self, error: PipelineError) -> AnalysisFailure {
        self.control.record(AnalysisStage::Failed);
        AnalysisFailure::new(self.current, error)
    }

    fn complete(&mut self) {
        self.current = AnalysisStage::Completed;
        self.control.record(AnalysisStage::Completed);
    }
}

/// Composes the pipeline components into a single analysis call
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    estimator: SpectralBandEstimator,
    clock: Arc<dyn Clock>,
}

impl AnalysisOrchestrator {
    pub fn new(estimator: SpectralBandEstimator) -> Self {
        Self::with_clock(estimator, Arc::new(SystemClock))
    }

    pub fn with_clock(estimator: SpectralBandEstimator, clock: Arc<dyn Clock>) -> Self {
        Self { estimator, clock }
    }

    pub fn engine_name(&self) -> &'static str {
        self.estimator.strategy().name()
    }

    pub fn strategy(&self) -> &SpectralEstimationStrategy {
        self.estimator.strategy()
    }

    pub fn analyze(
        &self,
        image: &RasterRgb,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        self.analyze_with(image, options, &RunControl::unbounded())
    }

    /// Run the full pipeline under `control`
    pub fn analyze_with(
        &self,
        image: &RasterRgb,
        options: &AnalysisOptions,
        control: &RunControl,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        let mut tracker = StageTracker::new(control);
        self.run(image, options, &mut tracker)
    }

    /// Decode `bytes` and run the pipeline. Decoding counts as part of estimation.
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        max_dimension: u32,
        options: &AnalysisOptions,
        control: &RunControl,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        let mut tracker = StageTracker::new(control);
        tracker.enter(AnalysisStage::Estimating)?;
        let image = decode_image(bytes, max_dimension).map_err(|e| tracker.fail(e))?;
        self.run(&image, options, &mut tracker)
    }

    fn run(
        &self,
        image: &RasterRgb,
        options: &AnalysisOptions,
        tracker: &mut StageTracker<'_>,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        let started = Instant::now();

        tracker.enter(AnalysisStage::Estimating)?;
        let cube = self
            .estimator
            .estimate(image, options.band_count, options.wavelength_range, options.seed)
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(AnalysisStage::IndexComputation)?;
        let indices = compute_indices(&cube).map_err(|e| tracker.fail(e))?;
        let hyperspectral_bands = cube.band_count();
        let wavelength_range = cube.wavelength_range();
        drop(cube);

        tracker.enter(AnalysisStage::Classifying)?;
        let classification = classify(&indices).map_err(|e| tracker.fail(e))?;

        tracker.enter(AnalysisStage::Recommending)?;
        let recommendations = recommend(&classification, &indices);

        tracker.complete();
        tracing::debug!(
            pixels = classification.pixel_count(),
            bands = hyperspectral_bands,
            dominant = %classification.dominant_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(AnalysisResult {
            vegetation_indices: indices.to_report(),
            health_analysis: classification.to_report(),
            hyperspectral_bands,
            wavelength_range,
            recommendations,
            analysis_timestamp: self.clock.now(),
            seed: options.seed,
            estimation_engine: self.engine_name().to_string(),
        })
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(SpectralBandEstimator::default())
    }
}
