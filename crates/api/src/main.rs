use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rivalwatch_api::config::ServerConfig;
use rivalwatch_api::router::build_app_router;
use rivalwatch_api::state::AppState;
use rivalwatch_inference::ProviderSet;
use rivalwatch_pipeline::store::{PgJobStore, PgSettingsStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rivalwatch_api=debug,rivalwatch_pipeline=debug,rivalwatch_inference=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        max_concurrent = config.dispatch.max_concurrent,
        batch_size = config.dispatch.batch_size,
        launch_interval_ms = config.dispatch.launch_interval.as_millis() as u64,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = rivalwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    rivalwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    rivalwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Inference backends ---
    let providers =
        ProviderSet::from_config(&config.providers).expect("Failed to build inference HTTP client");
    tracing::info!(
        openrouter = config.providers.openrouter_api_key.is_some(),
        gemini = config.providers.gemini_api_key.is_some(),
        "Inference backends configured",
    );

    // --- App state ---
    let state = AppState::new(
        config.clone(),
        Arc::new(PgJobStore::new(pool.clone())),
        Arc::new(PgSettingsStore::new(pool)),
        providers,
    );
    let dispatcher = Arc::clone(&state.dispatcher);

    // --- Dispatch ticker ---
    let ticker_cancel = tokio_util::sync::CancellationToken::new();
    let ticker_handle = (config.tick_secs > 0).then(|| {
        tokio::spawn(rivalwatch_api::background::dispatch_ticker::run(
            Arc::clone(&dispatcher),
            Duration::from_secs(config.tick_secs),
            ticker_cancel.clone(),
        ))
    });

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    ticker_cancel.cancel();
    if let Some(handle) = ticker_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Dispatch ticker stopped");
    }

    // In-flight jobs not finished by the deadline stay in_progress until an
    // operator recovers them.
    let drained = dispatcher
        .drain(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Analysis workers drained");
    } else {
        tracing::warn!(
            remaining = dispatcher.active_tasks(),
            "Shutdown timeout elapsed with analysis jobs still running",
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
