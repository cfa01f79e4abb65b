//! Repository for the single-row `analysis_settings` table.

use rivalwatch_core::settings::AnalysisSettings;
use sqlx::PgPool;

use crate::models::settings::AnalysisSettingsRow;

const COLUMNS: &str = "enabled, provider, model, updated_at";

/// Reads and writes the scheduler settings row (`id = 1`).
pub struct SettingsRepo;

impl SettingsRepo {
    /// Fetch the settings row. The migration seeds it, so a missing row is
    /// reported as `RowNotFound`.
    pub async fn get(pool: &PgPool) -> Result<AnalysisSettingsRow, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_settings WHERE id = 1");
        sqlx::query_as::<_, AnalysisSettingsRow>(&query)
            .fetch_one(pool)
            .await
    }

    /// Overwrite the settings row. Callers validate the model beforehand.
    pub async fn update(
        pool: &PgPool,
        settings: &AnalysisSettings,
    ) -> Result<AnalysisSettingsRow, sqlx::Error> {
        let query = format!(
            "UPDATE analysis_settings \
             SET enabled = $1, provider = $2, model = $3, updated_at = NOW() \
             WHERE id = 1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalysisSettingsRow>(&query)
            .bind(settings.enabled)
            .bind(settings.provider.as_str())
            .bind(&settings.model)
            .fetch_one(pool)
            .await
    }
}
