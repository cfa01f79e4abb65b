//! Google Gemini `generateContent`.
//!
//! A [`GeminiClient`] is built for every call from the separately configured
//! API key, mirroring how the vendor SDK is used: nothing is cached between
//! requests except the underlying connection pool.

use async_trait::async_trait;
use rivalwatch_core::settings::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, ProviderError};
use crate::provider::{AnalysisRequest, InferenceProvider};

/// Vendor namespace Gemini expects in front of model names.
const MODEL_NAMESPACE: &str = "models/";

/// Vendor prefix used by the configured (`vendor/model`) model names.
const VENDOR_PREFIX: &str = "google/";

/// Rewrite a configured model name into Gemini's namespace.
///
/// `google/gemini-2.5-flash`, `gemini-2.5-flash` and
/// `models/gemini-2.5-flash` all become `models/gemini-2.5-flash`.
pub fn normalize_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with(MODEL_NAMESPACE) {
        return model.to_string();
    }
    let bare = model.strip_prefix(VENDOR_PREFIX).unwrap_or(model);
    format!("{MODEL_NAMESPACE}{bare}")
}

/// Best-effort MIME type from an image URL's extension.
fn guess_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: &'static str,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub fn build_request(request: &AnalysisRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(request.images.len() + 1);
    parts.push(Part::Text {
        text: request.prompt.clone(),
    });
    parts.extend(request.images.iter().map(|url| Part::File {
        file_data: FileData {
            mime_type: guess_mime_type(url),
            file_uri: url.clone(),
        },
    }));

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
    }
}

/// Thin per-call client for the Gemini REST API.
pub struct GeminiClient<'a> {
    http: &'a reqwest::Client,
    base_url: &'a str,
    api_key: &'a str,
}

impl<'a> GeminiClient<'a> {
    pub fn new(http: &'a reqwest::Client, base_url: &'a str, api_key: &'a str) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Run `generateContent` and return the concatenated text of the first
    /// candidate.
    pub async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            normalize_model(model)
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key)
            .json(body)
            .send()
            .await?;

        let body: GenerateContentResponse = ensure_success(ProviderKind::Gemini, response)
            .await?
            .json()
            .await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion(ProviderKind::Gemini));
        }
        Ok(text)
    }
}

/// Gemini backend.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    pub fn new(http: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(self.kind()))?;

        tracing::debug!(
            model = %normalize_model(&request.model),
            images = request.images.len(),
            "Sending Gemini generateContent",
        );

        GeminiClient::new(&self.http, &self.base_url, api_key)
            .generate_content(&request.model, &build_request(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_are_normalized_into_namespace() {
        assert_eq!(normalize_model("google/gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(normalize_model("gemini-2.5-pro"), "models/gemini-2.5-pro");
        assert_eq!(normalize_model("models/gemini-2.0-flash"), "models/gemini-2.0-flash");
    }

    #[test]
    fn mime_type_guessed_from_extension() {
        assert_eq!(guess_mime_type("https://cdn/a.PNG?x=1"), "image/png");
        assert_eq!(guess_mime_type("https://cdn/a.webp"), "image/webp");
        assert_eq!(guess_mime_type("https://cdn/photo"), "image/jpeg");
    }

    #[test]
    fn request_uses_file_data_parts_for_images() {
        let body = build_request(&AnalysisRequest {
            prompt: "describe".into(),
            images: vec!["https://cdn/a.png".into()],
            model: "google/gemini-2.5-flash".into(),
        });
        let json = serde_json::to_value(&body).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["fileData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["fileData"]["fileUri"], "https://cdn/a.png");
    }
}
