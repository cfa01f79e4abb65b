//! Route definitions for the `/analysis` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Routes mounted at `/analysis`.
///
/// ```text
/// POST   /dispatch         -> dispatch
/// GET    /jobs/{id}        -> get_job
/// POST   /jobs/{id}/run    -> run_job
/// POST   /recover          -> recover
/// GET    /stats            -> stats
/// POST   /sensitivity      -> check_sensitivity
/// GET    /settings         -> get_settings
/// PUT    /settings         -> update_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dispatch", post(analysis::dispatch))
        .route("/jobs/{id}", get(analysis::get_job))
        .route("/jobs/{id}/run", post(analysis::run_job))
        .route("/recover", post(analysis::recover))
        .route("/stats", get(analysis::stats))
        .route("/sensitivity", post(analysis::check_sensitivity))
        .route(
            "/settings",
            get(analysis::get_settings).put(analysis::update_settings),
        )
}
