//! Periodic dispatch trigger.
//!
//! Optional replacement for an external cron hitting
//! `POST /api/v1/analysis/dispatch`. Runs one dispatch cycle per tick on a
//! fixed `tokio::time::interval`. Overlap with the HTTP trigger is harmless
//! because claims are atomic.

use std::sync::Arc;
use std::time::Duration;

use rivalwatch_pipeline::{DispatchOutcome, Dispatcher};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the dispatch ticker loop until `cancel` is triggered.
pub async fn run(dispatcher: Arc<Dispatcher>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Dispatch ticker started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dispatch ticker stopping");
                break;
            }
            _ = interval.tick() => {
                match dispatcher.dispatch().await {
                    DispatchOutcome::Accepted { current_in_progress, .. } => {
                        tracing::info!(current_in_progress, "Dispatch ticker: batch started");
                    }
                    DispatchOutcome::Unavailable { message } => {
                        tracing::error!(error = %message, "Dispatch ticker: store unavailable");
                    }
                    outcome => {
                        tracing::debug!(?outcome, "Dispatch ticker: nothing to do");
                    }
                }
            }
        }
    }
}
