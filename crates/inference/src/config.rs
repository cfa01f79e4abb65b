use std::time::Duration;

use crate::error::ProviderError;

/// Default OpenRouter API root (OpenAI-compatible).
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default Gemini API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Credentials and endpoints for the inference backends.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Per-request timeout in seconds. Bounds how long a hung backend can
    /// hold a job in progress.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                      |
    /// |-------------------------|----------------------------------------------|
    /// | `OPENROUTER_API_KEY`    | unset                                        |
    /// | `OPENROUTER_BASE_URL`   | `https://openrouter.ai/api/v1`               |
    /// | `GEMINI_API_KEY`        | unset                                        |
    /// | `GEMINI_BASE_URL`       | `https://generativelanguage.googleapis.com`  |
    /// | `PROVIDER_TIMEOUT_SECS` | `120`                                        |
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        Self {
            openrouter_api_key: non_empty("OPENROUTER_API_KEY"),
            openrouter_base_url: non_empty("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.into()),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            timeout_secs,
        }
    }

    /// Build the shared HTTP client used by both backends.
    pub fn build_client(&self) -> Result<reqwest::Client, ProviderError> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}
