//! Postgres-backed stores delegating to the `rivalwatch-db` repositories.

use async_trait::async_trait;
use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::settings::AnalysisSettings;
use rivalwatch_core::types::DbId;
use rivalwatch_db::models::content_item::{AnalysisStats, ContentItem};
use rivalwatch_db::models::status::AnalysisStatus;
use rivalwatch_db::repositories::{ContentItemRepo, SettingsRepo};
use rivalwatch_db::DbPool;

use super::{JobStore, SettingsStore};

#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn claim_next(&self) -> Result<Option<ContentItem>, sqlx::Error> {
        ContentItemRepo::claim_next(&self.pool).await
    }

    async fn claim_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        ContentItemRepo::claim_by_id(&self.pool, id).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        ContentItemRepo::find_by_id(&self.pool, id).await
    }

    async fn count_in_progress(&self) -> Result<i64, sqlx::Error> {
        ContentItemRepo::count_in_progress(&self.pool).await
    }

    async fn has_pending(&self) -> Result<bool, sqlx::Error> {
        ContentItemRepo::has_pending(&self.pool).await
    }

    async fn complete(&self, id: DbId, result: &AnalysisResult) -> Result<bool, sqlx::Error> {
        ContentItemRepo::complete(&self.pool, id, result).await
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        ContentItemRepo::fail(&self.pool, id, error).await
    }

    async fn requeue(&self, from: AnalysisStatus) -> Result<u64, sqlx::Error> {
        ContentItemRepo::requeue(&self.pool, from).await
    }

    async fn stats(&self) -> Result<AnalysisStats, sqlx::Error> {
        ContentItemRepo::stats(&self.pool).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        rivalwatch_db::health_check(&self.pool).await
    }
}

#[derive(Clone)]
pub struct PgSettingsStore {
    pool: DbPool,
}

impl PgSettingsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn load(&self) -> Result<AnalysisSettings, sqlx::Error> {
        SettingsRepo::get(&self.pool)
            .await?
            .into_settings()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    async fn save(&self, settings: &AnalysisSettings) -> Result<AnalysisSettings, sqlx::Error> {
        SettingsRepo::update(&self.pool, settings)
            .await?
            .into_settings()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }
}
