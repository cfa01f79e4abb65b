use std::sync::Arc;

use rivalwatch_inference::ProviderSet;
use rivalwatch_pipeline::{
    AnalysisWorker, Dispatcher, JobStore, SensitivityChecker, SettingsStore,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (everything is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The analysis queue.
    pub store: Arc<dyn JobStore>,
    /// Runtime analysis settings (flag, provider, model).
    pub settings: Arc<dyn SettingsStore>,
    /// Runs single jobs on demand.
    pub worker: Arc<AnalysisWorker>,
    /// Starts batch loops and tracks their workers.
    pub dispatcher: Arc<Dispatcher>,
    /// Synchronous content safety check.
    pub sensitivity: Arc<SensitivityChecker>,
}

impl AppState {
    /// Wire the scheduler components around the given stores and backends.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn JobStore>,
        settings: Arc<dyn SettingsStore>,
        providers: ProviderSet,
    ) -> Self {
        let worker = Arc::new(AnalysisWorker::new(
            Arc::clone(&store),
            Arc::clone(&settings),
            providers.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&settings),
            Arc::clone(&worker),
            config.dispatch,
        ));
        let sensitivity = Arc::new(SensitivityChecker::new(Arc::clone(&settings), providers));

        Self {
            config: Arc::new(config),
            store,
            settings,
            worker,
            dispatcher,
            sensitivity,
        }
    }
}
