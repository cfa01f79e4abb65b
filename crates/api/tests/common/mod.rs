#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rivalwatch_core::settings::{AnalysisSettings, ProviderKind, DEFAULT_MODEL};
use rivalwatch_inference::config::ProviderConfig;
use rivalwatch_inference::{AnalysisRequest, InferenceProvider, ProviderError, ProviderSet};
use rivalwatch_pipeline::dispatcher::DispatchLimits;
use rivalwatch_pipeline::store::{MemoryJobStore, MemorySettingsStore};
use tower::ServiceExt;

use rivalwatch_api::config::ServerConfig;
use rivalwatch_api::router::build_app_router;
use rivalwatch_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and a near-zero launch
/// interval.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        dispatch: DispatchLimits {
            max_concurrent: 20,
            batch_size: 5,
            launch_interval: Duration::from_millis(1),
        },
        tick_secs: 0,
        providers: ProviderConfig {
            openrouter_api_key: None,
            openrouter_base_url: "http://127.0.0.1:9".to_string(),
            gemini_api_key: None,
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Backend answering every call with the same reply, or the same error.
pub struct FixedProvider(pub Result<String, u16>);

#[async_trait]
impl InferenceProvider for FixedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openrouter
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<String, ProviderError> {
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ProviderError::api(
                ProviderKind::Openrouter,
                *status,
                "backend unavailable".to_string(),
            )),
        }
    }
}

/// The router plus direct handles on its in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub queue: Arc<MemoryJobStore>,
    pub settings: Arc<MemorySettingsStore>,
}

/// Build the full application router over in-memory stores, with analysis
/// enabled on the OpenRouter tag backed by `provider`.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app(provider: FixedProvider) -> TestApp {
    let queue = Arc::new(MemoryJobStore::new());
    let settings = Arc::new(MemorySettingsStore::new(AnalysisSettings {
        enabled: true,
        provider: ProviderKind::Openrouter,
        model: DEFAULT_MODEL.to_string(),
    }));
    let state = AppState::new(
        test_config(),
        queue.clone(),
        settings.clone(),
        ProviderSet::new().with(Arc::new(provider)),
    );

    TestApp {
        router: build_app_router(state.clone()),
        state,
        queue,
        settings,
    }
}

pub fn replying(text: &str) -> FixedProvider {
    FixedProvider(Ok(text.to_string()))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
