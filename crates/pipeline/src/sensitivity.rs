//! Synchronous content sensitivity check.
//!
//! Not queued and not persisted: the caller gets a verdict directly. The
//! check is fail-closed, so any answer the parser cannot fully trust
//! (including the bare `ext` refusal) comes back as unsafe.

use std::sync::Arc;

use rivalwatch_core::analysis::SensitivityVerdict;
use rivalwatch_core::parser::parse_sensitivity;
use rivalwatch_core::prompt::build_sensitivity_prompt;
use rivalwatch_inference::{AnalysisRequest, ProviderSet};

use crate::store::SettingsStore;
use crate::worker::AnalysisError;

pub struct SensitivityChecker {
    settings: Arc<dyn SettingsStore>,
    providers: ProviderSet,
}

impl SensitivityChecker {
    pub fn new(settings: Arc<dyn SettingsStore>, providers: ProviderSet) -> Self {
        Self {
            settings,
            providers,
        }
    }

    /// Ask the configured backend whether `text` (and `images`) is safe to
    /// show.
    ///
    /// Only failures to reach a backend are errors. An unusable answer is
    /// a verdict of unsafe.
    pub async fn check(
        &self,
        text: &str,
        images: &[String],
    ) -> Result<SensitivityVerdict, AnalysisError> {
        let settings = self
            .settings
            .load()
            .await
            .map_err(|e| AnalysisError::Settings(e.to_string()))?;
        let provider = self.providers.get(settings.provider)?;

        let raw = provider
            .analyze(&AnalysisRequest {
                prompt: build_sensitivity_prompt(text),
                images: images.to_vec(),
                model: settings.model,
            })
            .await?;

        let verdict = parse_sensitivity(&raw);
        tracing::info!(safe = verdict.safe, "Sensitivity check finished");
        Ok(verdict)
    }
}
