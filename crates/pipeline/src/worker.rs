//! Per-job analysis worker.
//!
//! A worker takes one claimed (in progress) item through
//! validate → prompt → provider → parse and always ends with exactly one
//! terminal write: `complete` on success, `fail` on any error, including a
//! panic anywhere in the sequence.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::error::CoreError;
use rivalwatch_core::parser::{parse_analysis, ParseError};
use rivalwatch_core::prompt::build_analysis_prompt;
use rivalwatch_core::types::DbId;
use rivalwatch_db::models::content_item::{ContentItem, JobState};
use rivalwatch_inference::{AnalysisRequest, ProviderError, ProviderSet};
use serde::Serialize;

use crate::store::{JobStore, SettingsStore};

/// Why a single analysis attempt failed. The `Display` text is what ends up
/// in the item's error column.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("settings unavailable: {0}")]
    Settings(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Terminal outcome of one job, as recorded (or attempted) in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded { result: AnalysisResult },
    Failed { error: String },
}

/// Errors from running one named job on demand.
#[derive(Debug, thiserror::Error)]
pub enum RunJobError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Reported when a finished job was requeued before its result was stored.
pub const DISCARDED_RESULT: &str = "result discarded: job no longer in progress";

/// Runs claimed jobs to a terminal state.
pub struct AnalysisWorker {
    store: Arc<dyn JobStore>,
    settings: Arc<dyn SettingsStore>,
    providers: ProviderSet,
}

impl AnalysisWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        settings: Arc<dyn SettingsStore>,
        providers: ProviderSet,
    ) -> Self {
        Self {
            store,
            settings,
            providers,
        }
    }

    /// Process one claimed job and record its terminal outcome.
    ///
    /// Never returns an error and never unwinds: every failure, panics
    /// included, becomes a `fail` write carrying the error text.
    pub async fn run(&self, job: ContentItem) -> JobOutcome {
        let job_id = job.id;
        tracing::info!(job_id, kind = ?job.kind(), "Analysis job started");

        let attempt = AssertUnwindSafe(self.attempt(&job)).catch_unwind().await;
        let result = match attempt {
            Ok(result) => result,
            Err(panic) => Err(AnalysisError::Panicked(panic_message(panic.as_ref()))),
        };

        self.record(job_id, result).await
    }

    /// Claim one specific item and run it to completion in the caller's task.
    ///
    /// Refuses items that do not exist, are already in progress, or have no
    /// usable link. Whatever the job outcome, the call succeeds once the
    /// claim does; the outcome describes what was recorded.
    pub async fn run_by_id(&self, id: DbId) -> Result<JobOutcome, RunJobError> {
        let Some(job) = self.store.claim_by_id(id).await? else {
            let existing = self.store.find_by_id(id).await?;
            return Err(match existing.map(|item| item.state()) {
                None => CoreError::NotFound {
                    entity: "content_item",
                    id,
                },
                Some(JobState::NoContent) => {
                    CoreError::Validation(format!("content item {id} has no link to analyze"))
                }
                Some(_) => CoreError::Conflict(format!("content item {id} is already in progress")),
            }
            .into());
        };

        Ok(self.run(job).await)
    }

    async fn attempt(&self, job: &ContentItem) -> Result<AnalysisResult, AnalysisError> {
        let link = job
            .usable_link()
            .ok_or_else(|| AnalysisError::Validation("content item has no link".to_string()))?;

        let settings = self
            .settings
            .load()
            .await
            .map_err(|e| AnalysisError::Settings(e.to_string()))?;
        let provider = self.providers.get(settings.provider)?;

        let kind = job.kind();
        let request = AnalysisRequest {
            prompt: build_analysis_prompt(kind, link, job.body.as_deref()),
            images: job.media_urls.clone(),
            model: settings.model,
        };

        let raw = provider.analyze(&request).await?;
        tracing::debug!(job_id = job.id, chars = raw.len(), "Provider responded");

        Ok(parse_analysis(kind, &raw)?)
    }

    async fn record(&self, job_id: DbId, result: Result<AnalysisResult, AnalysisError>) -> JobOutcome {
        let error = match result {
            Ok(result) => match self.store.complete(job_id, &result).await {
                Ok(true) => {
                    tracing::info!(job_id, "Analysis job completed");
                    return JobOutcome::Succeeded { result };
                }
                Ok(false) => {
                    tracing::warn!(job_id, "Analysis result discarded; job no longer in progress");
                    return JobOutcome::Failed {
                        error: DISCARDED_RESULT.to_string(),
                    };
                }
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Failed to record analysis result");
                    format!("failed to record result: {e}")
                }
            },
            Err(err) => err.to_string(),
        };

        match self.store.fail(job_id, &error).await {
            Ok(true) => tracing::warn!(job_id, error = %error, "Analysis job failed"),
            Ok(false) => {
                tracing::warn!(job_id, error = %error, "Analysis failure discarded; job no longer in progress")
            }
            Err(e) => {
                tracing::error!(job_id, error = %error, store_error = %e, "Failed to record analysis failure")
            }
        }
        JobOutcome::Failed { error }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(JobOutcome::Failed {
            error: "parse error: missing sentinel block".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "parse error: missing sentinel block");
    }
}
