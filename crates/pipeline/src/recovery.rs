//! Operator recovery: requeue every job stuck `in_progress` or `failed`.
//!
//! Requeueing in-progress jobs does not cancel their workers. A worker that
//! finishes afterwards finds its item no longer in progress and its terminal
//! write is discarded.

use rivalwatch_core::recovery::RecoveryTarget;
use rivalwatch_db::models::status::AnalysisStatus;

use crate::store::JobStore;

/// Move every job in `target` back to pending. Returns how many moved.
pub async fn recover(store: &dyn JobStore, target: RecoveryTarget) -> Result<u64, sqlx::Error> {
    let affected = store.requeue(AnalysisStatus::from(target)).await?;
    tracing::info!(?target, affected, "Requeued analysis jobs");
    Ok(affected)
}
