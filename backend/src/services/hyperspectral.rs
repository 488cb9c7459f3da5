//! Hyperspectral analysis service
//!
//! Runs the CPU-bound pipeline on the blocking thread pool, one worker pool
//! slot per image, under a per-image timeout. Batches fan out over the same
//! pool and report every item's outcome individually.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use shared::{
    is_allowed_image_file, AnalysisEnvelope, AnalysisResult, BatchItemResult, BatchReport,
    BatchStatus, BatchSummary,
};
use uuid::Uuid;

use super::worker_pool::WorkerPool;
use crate::analysis::{
    AnalysisFailure, AnalysisOptions, AnalysisOrchestrator, AnalysisStage, PipelineError,
    RunControl, SpectralEstimationStrategy,
};

/// One uploaded image of a batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BatchItem {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Clone)]
pub struct HyperspectralService {
    orchestrator: Arc<AnalysisOrchestrator>,
    pool: WorkerPool,
    timeout: Duration,
    max_dimension: u32,
}

impl HyperspectralService {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        pool: WorkerPool,
        timeout: Duration,
        max_dimension: u32,
    ) -> Self {
        Self {
            orchestrator,
            pool,
            timeout,
            max_dimension,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.orchestrator.engine_name()
    }

    pub fn strategy(&self) -> &SpectralEstimationStrategy {
        self.orchestrator.strategy()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Analyse one encoded image. The timeout covers waiting for a pool slot
    /// as well as the analysis itself.
    pub async fn analyze_image(
        &self,
        bytes: Vec<u8>,
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        let deadline = Instant::now() + self.timeout;

        let permit = match tokio::time::timeout_at(deadline.into(), self.pool.acquire()).await {
            Ok(acquired) => acquired.map_err(|e| AnalysisFailure::new(AnalysisStage::Pending, e))?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Timed out waiting for an analysis slot"
                );
                return Err(AnalysisFailure::new(
                    AnalysisStage::Pending,
                    PipelineError::Timeout,
                ));
            }
        };

        let control = RunControl::with_deadline(deadline);
        let watcher = control.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let max_dimension = self.max_dimension;

        let task = tokio::task::spawn_blocking(move || {
            // Slot stays claimed until the pipeline actually stops
            let _permit = permit;
            orchestrator.analyze_bytes(&bytes, max_dimension, &options, &control)
        });

        match tokio::time::timeout_at(deadline.into(), task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "Analysis task panicked");
                Err(AnalysisFailure::new(
                    watcher.stage(),
                    PipelineError::Internal("analysis task aborted".to_string()),
                ))
            }
            Err(_) => {
                let stage = watcher.stage();
                tracing::warn!(
                    %stage,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Analysis timed out"
                );
                Err(AnalysisFailure::new(stage, PipelineError::Timeout))
            }
        }
    }

    async fn analyze_item(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        // Names without an extension are left for the decoder to judge
        if file_name.contains('.') && !is_allowed_image_file(file_name) {
            return Err(AnalysisFailure::new(
                AnalysisStage::Pending,
                PipelineError::InvalidImage(format!("unsupported file type: {}", file_name)),
            ));
        }
        self.analyze_image(bytes, options).await
    }

    /// Analyse every item, isolating per-item failures
    pub async fn analyze_batch(&self, items: Vec<BatchItem>, options: AnalysisOptions) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let batch_size = items.len();
        let started = Instant::now();
        tracing::info!(%batch_id, batch_size, "Batch analysis started");

        let mut file_names = Vec::with_capacity(batch_size);
        let mut tasks = Vec::with_capacity(batch_size);
        for BatchItem { file_name, bytes } in items {
            let service = self.clone();
            let name = file_name.clone();
            tasks.push(tokio::spawn(async move {
                service.analyze_item(&name, bytes, options).await
            }));
            file_names.push(file_name);
        }

        let mut results = Vec::with_capacity(batch_size);
        for (file_name, task) in file_names.into_iter().zip(tasks) {
            let outcome = match task.await {
                Ok(Ok(result)) => AnalysisEnvelope::Success(result),
                Ok(Err(failure)) => {
                    tracing::warn!(%batch_id, file = %file_name, error = %failure, "Batch item failed");
                    AnalysisEnvelope::Error(failure.to_error_envelope())
                }
                Err(join_error) => {
                    tracing::error!(%batch_id, file = %file_name, error = %join_error, "Batch task aborted");
                    let failure = AnalysisFailure::new(
                        AnalysisStage::Pending,
                        PipelineError::Internal("analysis task aborted".to_string()),
                    );
                    AnalysisEnvelope::Error(failure.to_error_envelope())
                }
            };
            results.push(BatchItemResult { file_name, outcome });
        }

        let successful = results.iter().filter(|r| r.outcome.is_success()).count();
        let failed = batch_size - successful;
        let total_processing_time_secs = started.elapsed().as_secs_f64();
        let average_time_per_image_secs = if batch_size == 0 {
            0.0
        } else {
            total_processing_time_secs / batch_size as f64
        };

        tracing::info!(%batch_id, successful, failed, total_processing_time_secs, "Batch analysis finished");

        BatchReport {
            status: BatchStatus::from_counts(successful, failed),
            batch_size,
            results,
            summary: BatchSummary {
                successful,
                failed,
                total: batch_size,
                total_processing_time_secs,
                average_time_per_image_secs,
            },
            timestamp: Utc::now(),
        }
    }
}
