//! Batch dispatcher.
//!
//! One [`Dispatcher::dispatch`] call runs a cheap synchronous pre-check
//! (enabled flag, global concurrency ceiling, queue non-empty) and, when it
//! passes, detaches a batch loop that claims up to `batch_size` items
//! spaced `launch_interval` apart. Each claim is handed to an
//! [`AnalysisWorker`] on its own task and is never awaited by the loop.
//!
//! Nothing here is serialized between callers: overlapping dispatches are
//! safe because every claim is atomic in the store. The ceiling is a soft
//! bound; racing loops may overshoot it by at most one batch each.

use std::sync::Arc;
use std::time::Duration;

use rivalwatch_core::types::DbId;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::store::{JobStore, SettingsStore};
use crate::worker::{AnalysisWorker, JobOutcome};

/// Default ceiling on concurrently in-progress items.
pub const DEFAULT_MAX_CONCURRENT: i64 = 20;
/// Default number of claims per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Default spacing between successive launches in a batch.
pub const DEFAULT_LAUNCH_INTERVAL: Duration = Duration::from_millis(2_000);

/// Throughput limits for the batch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_concurrent: i64,
    pub batch_size: usize,
    pub launch_interval: Duration,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            batch_size: DEFAULT_BATCH_SIZE,
            launch_interval: DEFAULT_LAUNCH_INTERVAL,
        }
    }
}

/// Result of a dispatch request, decided before any claim happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Analysis is switched off in settings.
    Disabled,
    /// The in-progress count is already at the ceiling.
    CeilingReached { current_count: i64 },
    /// No claimable item exists.
    NothingPending,
    /// A batch loop was started.
    Accepted {
        batch_size: usize,
        current_in_progress: i64,
        ceiling: i64,
    },
    /// The pre-check could not read the store.
    Unavailable { message: String },
}

/// Why a batch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStop {
    /// All `batch_size` iterations ran.
    Completed,
    /// The ceiling was reached mid-batch.
    CeilingReached,
    /// A claim returned nothing.
    QueueEmpty,
}

/// What one batch loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// IDs handed to workers, in launch order.
    pub launched: Vec<DbId>,
    pub stop: BatchStop,
}

/// Starts batch loops and owns the tasks they spawn.
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    settings: Arc<dyn SettingsStore>,
    worker: Arc<AnalysisWorker>,
    limits: DispatchLimits,
    tasks: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        settings: Arc<dyn SettingsStore>,
        worker: Arc<AnalysisWorker>,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            store,
            settings,
            worker,
            limits,
            tasks: TaskTracker::new(),
        }
    }

    pub fn limits(&self) -> DispatchLimits {
        self.limits
    }

    /// Run the pre-check and, if it passes, start a batch loop in the
    /// background. Returns as soon as the outcome is known.
    pub async fn dispatch(&self) -> DispatchOutcome {
        self.start().await.0
    }

    /// Like [`Dispatcher::dispatch`], also returning the batch loop handle
    /// when one was started.
    pub async fn start(&self) -> (DispatchOutcome, Option<JoinHandle<BatchReport>>) {
        let outcome = self.precheck().await;
        if !matches!(outcome, DispatchOutcome::Accepted { .. }) {
            tracing::debug!(?outcome, "Dispatch declined");
            return (outcome, None);
        }

        tracing::info!(?outcome, "Dispatch accepted");
        let batch = BatchLoop {
            store: Arc::clone(&self.store),
            worker: Arc::clone(&self.worker),
            limits: self.limits,
            tasks: self.tasks.clone(),
        };
        let handle = self.tasks.spawn(batch.run());
        (outcome, Some(handle))
    }

    async fn precheck(&self) -> DispatchOutcome {
        match self.settings.load().await {
            Ok(settings) if !settings.enabled => return DispatchOutcome::Disabled,
            Ok(_) => {}
            Err(e) => return unavailable("load settings", e),
        }

        let current = match self.store.count_in_progress().await {
            Ok(count) => count,
            Err(e) => return unavailable("count in-progress jobs", e),
        };
        if current >= self.limits.max_concurrent {
            return DispatchOutcome::CeilingReached {
                current_count: current,
            };
        }

        if self.limits.batch_size == 0 {
            return DispatchOutcome::NothingPending;
        }

        match self.store.has_pending().await {
            Ok(true) => DispatchOutcome::Accepted {
                batch_size: self.limits.batch_size,
                current_in_progress: current,
                ceiling: self.limits.max_concurrent,
            },
            Ok(false) => DispatchOutcome::NothingPending,
            Err(e) => unavailable("check pending jobs", e),
        }
    }

    /// Wait up to `timeout` for every batch loop and worker to finish.
    /// Returns `false` on timeout.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tasks.close();
        let remaining = self.tasks.len();
        if remaining > 0 {
            tracing::info!(remaining, "Waiting for analysis tasks to finish");
        }
        tokio::time::timeout(timeout, self.tasks.wait()).await.is_ok()
    }

    /// Number of batch loops and workers still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }
}

fn unavailable(action: &str, error: sqlx::Error) -> DispatchOutcome {
    tracing::error!(error = %error, "Dispatch pre-check failed to {action}");
    DispatchOutcome::Unavailable {
        message: format!("failed to {action}: {error}"),
    }
}

/// One detached batch: claim, launch, wait, repeat.
struct BatchLoop {
    store: Arc<dyn JobStore>,
    worker: Arc<AnalysisWorker>,
    limits: DispatchLimits,
    tasks: TaskTracker,
}

impl BatchLoop {
    async fn run(self) -> BatchReport {
        let mut launched = Vec::new();
        let mut stop = BatchStop::Completed;

        for iteration in 0..self.limits.batch_size {
            if iteration > 0 {
                tokio::time::sleep(self.limits.launch_interval).await;
            }

            match self.store.count_in_progress().await {
                Ok(count) if count >= self.limits.max_concurrent => {
                    tracing::info!(count, ceiling = self.limits.max_concurrent, "Ceiling reached mid-batch");
                    stop = BatchStop::CeilingReached;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, iteration, "Failed to count in-progress jobs");
                    continue;
                }
            }

            let job = match self.store.claim_next().await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    stop = BatchStop::QueueEmpty;
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, iteration, "Failed to claim next job");
                    continue;
                }
            };

            let job_id = job.id;
            tracing::info!(job_id, iteration, "Job claimed, launching worker");
            launched.push(job_id);

            let worker = Arc::clone(&self.worker);
            self.tasks.spawn(async move {
                if let JobOutcome::Failed { error } = worker.run(job).await {
                    tracing::debug!(job_id, error = %error, "Worker finished with failure");
                }
            });
        }

        tracing::info!(launched = launched.len(), ?stop, "Batch loop finished");
        BatchReport { launched, stop }
    }
}
