use std::time::Duration;

use rivalwatch_inference::config::ProviderConfig;
use rivalwatch_pipeline::dispatcher::{
    DispatchLimits, DEFAULT_BATCH_SIZE, DEFAULT_LAUNCH_INTERVAL, DEFAULT_MAX_CONCURRENT,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight analysis jobs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Batch loop throughput limits.
    pub dispatch: DispatchLimits,
    /// Built-in dispatch ticker period in seconds. `0` disables the ticker
    /// and leaves triggering to an external scheduler.
    pub tick_secs: u64,
    /// Inference backend credentials and endpoints.
    pub providers: ProviderConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                       |
    /// | `ANALYSIS_MAX_CONCURRENT`     | `20`                       |
    /// | `ANALYSIS_BATCH_SIZE`         | `5`                        |
    /// | `ANALYSIS_LAUNCH_INTERVAL_MS` | `2000`                     |
    /// | `ANALYSIS_TICK_SECS`          | `0`                        |
    ///
    /// Provider variables are documented on [`ProviderConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let max_concurrent: i64 = std::env::var("ANALYSIS_MAX_CONCURRENT")
            .map(|v| v.parse().expect("ANALYSIS_MAX_CONCURRENT must be a valid i64"))
            .unwrap_or(DEFAULT_MAX_CONCURRENT);

        let batch_size: usize = std::env::var("ANALYSIS_BATCH_SIZE")
            .map(|v| v.parse().expect("ANALYSIS_BATCH_SIZE must be a valid usize"))
            .unwrap_or(DEFAULT_BATCH_SIZE);
        assert!(batch_size > 0, "ANALYSIS_BATCH_SIZE must be at least 1");

        let launch_interval = std::env::var("ANALYSIS_LAUNCH_INTERVAL_MS")
            .map(|v| {
                Duration::from_millis(
                    v.parse()
                        .expect("ANALYSIS_LAUNCH_INTERVAL_MS must be a valid u64"),
                )
            })
            .unwrap_or(DEFAULT_LAUNCH_INTERVAL);

        let tick_secs: u64 = std::env::var("ANALYSIS_TICK_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("ANALYSIS_TICK_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            dispatch: DispatchLimits {
                max_concurrent,
                batch_size,
                launch_interval,
            },
            tick_secs,
            providers: ProviderConfig::from_env(),
        }
    }
}
