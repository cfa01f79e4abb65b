//! OpenAI-compatible chat completions, as served by OpenRouter.
//!
//! One request/response call per analysis, authenticated with a bearer key.

use async_trait::async_trait;
use rivalwatch_core::settings::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, ProviderError};
use crate::provider::{AnalysisRequest, InferenceProvider};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<MessagePart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Build the single-user-turn request body: the prompt, then each image.
pub(crate) fn build_request(request: &AnalysisRequest) -> ChatRequest {
    let mut content = Vec::with_capacity(request.images.len() + 1);
    content.push(MessagePart::Text {
        text: request.prompt.clone(),
    });
    content.extend(request.images.iter().map(|url| MessagePart::ImageUrl {
        image_url: ImageUrl { url: url.clone() },
    }));

    ChatRequest {
        model: request.model.clone(),
        messages: vec![Message {
            role: "user",
            content,
        }],
    }
}

/// OpenRouter backend.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouterProvider {
    /// * `base_url` - API root, e.g. `https://openrouter.ai/api/v1`.
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenRouterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openrouter
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(self.kind()))?;

        tracing::debug!(
            model = %request.model,
            images = request.images.len(),
            "Sending OpenRouter chat completion",
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&build_request(request))
            .send()
            .await?;

        let body: ChatResponse = ensure_success(self.kind(), response).await?.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyCompletion(self.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_interleaves_text_then_images() {
        let body = build_request(&AnalysisRequest {
            prompt: "describe".into(),
            images: vec!["https://cdn/a.jpg".into(), "https://cdn/b.png".into()],
            model: "openai/gpt-4o".into(),
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "openai/gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        let parts = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "https://cdn/a.jpg");
        assert_eq!(parts[2]["image_url"]["url"], "https://cdn/b.png");
    }

    #[test]
    fn request_without_images_has_single_text_part() {
        let body = build_request(&AnalysisRequest {
            prompt: "describe".into(),
            images: vec![],
            model: "m".into(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["content"].as_array().unwrap().len(), 1);
    }
}
