pub mod analysis;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /analysis/dispatch                     trigger one dispatch cycle (POST)
/// /analysis/jobs/{id}                    read back one job (GET)
/// /analysis/jobs/{id}/run                claim and run one job now (POST)
/// /analysis/recover                      requeue in_progress or failed (POST)
/// /analysis/stats                        per-state counts (GET)
/// /analysis/sensitivity                  synchronous safety check (POST)
/// /analysis/settings                     get, update (GET, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/analysis", analysis::router())
}
