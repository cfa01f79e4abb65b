//! Runtime settings for the analysis scheduler.
//!
//! These are edited from the dashboard's settings screen and re-read on
//! every dispatch cycle, so they can change without a restart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which inference backend serves analysis requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions through OpenRouter.
    Openrouter,
    /// Google Gemini `generateContent`.
    Gemini,
}

/// Accepted provider tags, in the form stored in the settings table.
pub const VALID_PROVIDERS: &[&str] = &["openrouter", "gemini"];

/// Models an operator may select. Names use the OpenRouter `vendor/model`
/// form; the Gemini backend rewrites them into its own namespace.
pub const ALLOWED_MODELS: &[&str] = &[
    "google/gemini-2.5-flash",
    "google/gemini-2.5-pro",
    "google/gemini-2.0-flash",
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "anthropic/claude-sonnet-4",
];

/// Model used when nothing has been configured yet.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openrouter => "openrouter",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "openrouter" => Ok(Self::Openrouter),
            "gemini" => Ok(Self::Gemini),
            other => Err(CoreError::Validation(format!(
                "Invalid provider '{other}'. Must be one of: {}",
                VALID_PROVIDERS.join(", ")
            ))),
        }
    }
}

/// Snapshot of the scheduler settings taken at the start of a dispatch
/// cycle or worker run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Master switch. When off, dispatch cycles claim nothing.
    pub enabled: bool,
    pub provider: ProviderKind,
    pub model: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::Openrouter,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Validate that a model name is on the allow-list.
pub fn validate_model(model: &str) -> Result<(), CoreError> {
    if ALLOWED_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported model '{model}'. Must be one of: {}",
            ALLOWED_MODELS.join(", ")
        )))
    }
}
