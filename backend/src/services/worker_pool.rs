//! Bounded pool of analysis slots

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::analysis::PipelineError;

/// What to do when every analysis slot is busy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Wait until a slot frees up
    #[default]
    Queue,
    /// Fail immediately with `PoolExhausted`
    Reject,
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    policy: ExhaustionPolicy,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize, policy: ExhaustionPolicy) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            policy,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Claim a slot according to the pool's policy. The slot is released when
    /// the permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, PipelineError> {
        match self.policy {
            ExhaustionPolicy::Queue => self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::Internal("worker pool closed".to_string())),
            ExhaustionPolicy::Reject => {
                self.semaphore
                    .clone()
                    .try_acquire_owned()
                    .map_err(|e| match e {
                        TryAcquireError::NoPermits => {
                            PipelineError::PoolExhausted(self.max_concurrent)
                        }
                        TryAcquireError::Closed => {
                            PipelineError::Internal("worker pool closed".to_string())
                        }
                    })
            }
        }
    }
}
