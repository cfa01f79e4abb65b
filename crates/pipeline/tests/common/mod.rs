//! Shared fixtures for scheduler tests: scripted providers and a queue
//! wrapper that injects store failures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rivalwatch_core::analysis::{AnalysisKind, AnalysisResult};
use rivalwatch_core::settings::{AnalysisSettings, ProviderKind, DEFAULT_MODEL};
use rivalwatch_core::types::DbId;
use rivalwatch_db::models::content_item::{AnalysisStats, ContentItem, NewContentItem};
use rivalwatch_db::models::status::AnalysisStatus;
use rivalwatch_inference::{AnalysisRequest, InferenceProvider, ProviderError, ProviderSet};
use rivalwatch_pipeline::store::{MemoryJobStore, MemorySettingsStore};
use rivalwatch_pipeline::{AnalysisWorker, DispatchLimits, Dispatcher, JobStore, SettingsStore};
use tokio::sync::Semaphore;

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// What a [`ScriptedProvider`] does on every call.
pub enum Script {
    Reply(String),
    Fail(u16, String),
    Panic,
}

pub struct ScriptedProvider {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn reply(text: &str) -> Arc<Self> {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openrouter
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(status, body) => {
                Err(ProviderError::api(ProviderKind::Openrouter, *status, body.clone()))
            }
            Script::Panic => panic!("provider exploded"),
        }
    }
}

/// Holds every call until [`BlockingProvider::release`] hands out permits.
pub struct BlockingProvider {
    gate: Semaphore,
    reply: String,
}

impl BlockingProvider {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            reply: reply.to_string(),
        })
    }

    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }
}

#[async_trait]
impl InferenceProvider for BlockingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openrouter
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<String, ProviderError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        permit.forget();
        Ok(self.reply.clone())
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Delegates to a [`MemoryJobStore`], failing the first `claim_failures`
/// calls to `claim_next` and the first `complete_failures` calls to
/// `complete`.
pub struct FlakyStore {
    inner: Arc<MemoryJobStore>,
    claim_failures: AtomicUsize,
    complete_failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryJobStore>, claim_failures: usize) -> Self {
        Self {
            inner,
            claim_failures: AtomicUsize::new(claim_failures),
            complete_failures: AtomicUsize::new(0),
        }
    }

    pub fn failing_completes(inner: Arc<MemoryJobStore>, complete_failures: usize) -> Self {
        Self {
            inner,
            claim_failures: AtomicUsize::new(0),
            complete_failures: AtomicUsize::new(complete_failures),
        }
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn claim_next(&self) -> Result<Option<ContentItem>, sqlx::Error> {
        if take_failure(&self.claim_failures) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.claim_next().await
    }

    async fn claim_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        self.inner.claim_by_id(id).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        self.inner.find_by_id(id).await
    }

    async fn count_in_progress(&self) -> Result<i64, sqlx::Error> {
        self.inner.count_in_progress().await
    }

    async fn has_pending(&self) -> Result<bool, sqlx::Error> {
        self.inner.has_pending().await
    }

    async fn complete(&self, id: DbId, result: &AnalysisResult) -> Result<bool, sqlx::Error> {
        if take_failure(&self.complete_failures) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.complete(id, result).await
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        self.inner.fail(id, error).await
    }

    async fn requeue(&self, from: AnalysisStatus) -> Result<u64, sqlx::Error> {
        self.inner.requeue(from).await
    }

    async fn stats(&self) -> Result<AnalysisStats, sqlx::Error> {
        self.inner.stats().await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.inner.ping().await
    }
}

/// A settings store whose reads always fail.
pub struct BrokenSettings;

#[async_trait]
impl SettingsStore for BrokenSettings {
    async fn load(&self) -> Result<AnalysisSettings, sqlx::Error> {
        Err(sqlx::Error::PoolClosed)
    }

    async fn save(&self, _settings: &AnalysisSettings) -> Result<AnalysisSettings, sqlx::Error> {
        Err(sqlx::Error::PoolClosed)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub fn enabled_settings() -> AnalysisSettings {
    AnalysisSettings {
        enabled: true,
        provider: ProviderKind::Openrouter,
        model: DEFAULT_MODEL.to_string(),
    }
}

pub fn fast_limits(max_concurrent: i64, batch_size: usize) -> DispatchLimits {
    DispatchLimits {
        max_concurrent,
        batch_size,
        launch_interval: Duration::from_millis(1),
    }
}

pub fn summary_item(link: Option<&str>) -> NewContentItem {
    NewContentItem {
        link: link.map(String::from),
        body: Some("New flavour drops Friday".to_string()),
        media_urls: vec!["https://cdn.example.com/1.jpg".to_string()],
        analysis_kind: AnalysisKind::Summary,
    }
}

pub struct Harness {
    pub queue: Arc<MemoryJobStore>,
    pub settings: Arc<MemorySettingsStore>,
    pub worker: Arc<AnalysisWorker>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn new(provider: Arc<dyn InferenceProvider>, limits: DispatchLimits) -> Self {
        let queue = Arc::new(MemoryJobStore::new());
        Self::with_store(queue.clone(), queue, provider, limits)
    }

    /// Build around `store`, with `queue` as the underlying memory store
    /// used for assertions.
    pub fn with_store(
        queue: Arc<MemoryJobStore>,
        store: Arc<dyn JobStore>,
        provider: Arc<dyn InferenceProvider>,
        limits: DispatchLimits,
    ) -> Self {
        let settings = Arc::new(MemorySettingsStore::new(enabled_settings()));
        let worker = Arc::new(AnalysisWorker::new(
            store.clone(),
            settings.clone(),
            ProviderSet::new().with(provider),
        ));
        let dispatcher = Dispatcher::new(store, settings.clone(), worker.clone(), limits);
        Self {
            queue,
            settings,
            worker,
            dispatcher,
        }
    }

    pub fn enqueue(&self, count: usize) -> Vec<DbId> {
        (0..count)
            .map(|i| {
                let link = format!("https://social.example.com/p/{i}");
                self.queue.enqueue(summary_item(Some(&link))).id
            })
            .collect()
    }

    /// Wait until no worker is running, failing the test after a few seconds.
    pub async fn settle(&self) {
        assert!(
            self.dispatcher.drain(Duration::from_secs(5)).await,
            "analysis tasks did not finish"
        );
    }
}
