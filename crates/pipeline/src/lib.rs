//! The AI analysis scheduler.
//!
//! Pulls pending content items from the queue through an atomic claim,
//! runs each through an inference backend on its own task, and records
//! exactly one terminal outcome per claimed item. The pieces:
//!
//! - [`store`]: the queue and settings seams, with Postgres and in-memory
//!   implementations.
//! - [`worker`]: the per-job state machine.
//! - [`dispatcher`]: concurrency ceiling, batching and launch spacing.
//! - [`recovery`]: operator requeue of stuck or failed jobs.
//! - [`sensitivity`]: the synchronous content safety check.

pub mod dispatcher;
pub mod recovery;
pub mod sensitivity;
pub mod store;
pub mod worker;

pub use dispatcher::{DispatchLimits, DispatchOutcome, Dispatcher};
pub use sensitivity::SensitivityChecker;
pub use store::{JobStore, SettingsStore};
pub use worker::{AnalysisError, AnalysisWorker, JobOutcome, RunJobError};
