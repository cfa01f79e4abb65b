//! Adapters for the external multimodal inference backends.
//!
//! Both backends implement [`provider::InferenceProvider`]; callers pick one
//! at runtime by [`ProviderKind`](rivalwatch_core::settings::ProviderKind)
//! through [`provider::ProviderSet`] and never see vendor request types.

pub mod config;
pub mod error;
pub mod gemini;
pub mod openrouter;
pub mod provider;

pub use error::ProviderError;
pub use provider::{AnalysisRequest, InferenceProvider, ProviderSet};
