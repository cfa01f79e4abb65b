//! The backend-neutral analysis capability and runtime backend selection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rivalwatch_core::settings::ProviderKind;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::gemini::GeminiProvider;
use crate::openrouter::OpenRouterProvider;

/// One single-turn multimodal request: text followed by zero or more images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
    /// Publicly reachable image URLs, in display order.
    pub images: Vec<String>,
    /// Model identifier as configured (`vendor/model`).
    pub model: String,
}

/// A multimodal chat backend that turns one request into raw completion text.
///
/// Implementations hold no per-request state, so one instance may serve any
/// number of concurrent calls.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderError>;
}

/// The configured backends, keyed by their runtime tag.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn InferenceProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own [`InferenceProvider::kind`],
    /// replacing any previous one.
    pub fn with(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Build both HTTP backends sharing one connection pool.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.build_client()?;
        Ok(Self::new()
            .with(Arc::new(OpenRouterProvider::new(
                client.clone(),
                config.openrouter_base_url.clone(),
                config.openrouter_api_key.clone(),
            )))
            .with(Arc::new(GeminiProvider::new(
                client,
                config.gemini_base_url.clone(),
                config.gemini_api_key.clone(),
            ))))
    }

    /// Look up the backend for `kind`.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn InferenceProvider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::NotConfigured(kind))
    }
}
