//! Single-row runtime settings for the analysis scheduler.

use rivalwatch_core::error::CoreError;
use rivalwatch_core::settings::AnalysisSettings;
use rivalwatch_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// The row from the `analysis_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalysisSettingsRow {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub updated_at: Timestamp,
}

impl AnalysisSettingsRow {
    /// Convert into the domain settings, rejecting an unknown provider tag.
    pub fn into_settings(self) -> Result<AnalysisSettings, CoreError> {
        Ok(AnalysisSettings {
            enabled: self.enabled,
            provider: self.provider.parse()?,
            model: self.model,
        })
    }
}
