//! Storage seams used by the worker and dispatcher.
//!
//! [`JobStore`] is the only shared mutable resource in the scheduler. All
//! job exclusivity comes from its claim methods, which must each be a
//! single atomic compare-and-set on the item status.

use async_trait::async_trait;
use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::settings::AnalysisSettings;
use rivalwatch_core::types::DbId;
use rivalwatch_db::models::content_item::{AnalysisStats, ContentItem};
use rivalwatch_db::models::status::AnalysisStatus;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryJobStore, MemorySettingsStore};
pub use postgres::{PgJobStore, PgSettingsStore};

/// The analysis queue.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically move the oldest claimable pending item to in progress.
    async fn claim_next(&self) -> Result<Option<ContentItem>, sqlx::Error>;

    /// Atomically move one item to in progress unless it already is, or
    /// has no usable link.
    async fn claim_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error>;

    async fn count_in_progress(&self) -> Result<i64, sqlx::Error>;

    async fn has_pending(&self) -> Result<bool, sqlx::Error>;

    /// Terminal success write. `false` if the item was no longer in progress.
    async fn complete(&self, id: DbId, result: &AnalysisResult) -> Result<bool, sqlx::Error>;

    /// Terminal failure write. `false` if the item was no longer in progress.
    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error>;

    /// Move every item in `from` back to pending, clearing errors.
    async fn requeue(&self, from: AnalysisStatus) -> Result<u64, sqlx::Error>;

    async fn stats(&self) -> Result<AnalysisStats, sqlx::Error>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// Source of the runtime scheduler settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<AnalysisSettings, sqlx::Error>;

    /// Persist new settings. Callers validate them first.
    async fn save(&self, settings: &AnalysisSettings) -> Result<AnalysisSettings, sqlx::Error>;
}
