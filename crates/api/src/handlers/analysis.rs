//! Handlers for the `/analysis` resource.
//!
//! The trigger endpoint never fails: every pre-check result, including a
//! store outage, is reported as a [`DispatchOutcome`] with a 2xx status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rivalwatch_core::analysis::AnalysisResult;
use rivalwatch_core::error::CoreError;
use rivalwatch_core::recovery::RecoveryTarget;
use rivalwatch_core::settings::{validate_model, AnalysisSettings, ProviderKind};
use rivalwatch_core::types::{DbId, Timestamp};
use rivalwatch_db::models::content_item::{ContentItem, JobState};
use rivalwatch_pipeline::recovery;
use rivalwatch_pipeline::DispatchOutcome;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Read-back view of one content item's analysis state.
#[derive(Debug, Serialize)]
pub struct JobView {
    pub id: DbId,
    pub state: JobState,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub analyzed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<ContentItem> for JobView {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            state: item.state(),
            result: item.result(),
            error: item.error_message.clone(),
            claimed_at: item.claimed_at,
            analyzed_at: item.analyzed_at,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub status: RecoveryTarget,
    pub affected: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SensitivityRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial settings update. Omitted fields keep their current value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettings {
    pub enabled: Option<bool>,
    #[validate(length(min = 1, message = "provider must not be empty"))]
    pub provider: Option<String>,
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: Option<String>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/dispatch
///
/// Run one dispatch cycle. Returns 202 when a batch loop was started and
/// 200 for every other outcome.
pub async fn dispatch(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.dispatcher.dispatch().await;
    let status = match outcome {
        DispatchOutcome::Accepted { .. } => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    (status, Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// GET /api/v1/analysis/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "content_item",
            id,
        })?;
    Ok(Json(DataResponse {
        data: JobView::from(item),
    }))
}

/// POST /api/v1/analysis/jobs/{id}/run
///
/// Claim one item and run it to completion before responding. A failed
/// analysis is still a 200; the body carries the recorded error.
pub async fn run_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.worker.run_by_id(id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Recovery and stats
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/recover
///
/// Requeue every job in `in_progress` or `failed`. Any other status is a
/// 400.
pub async fn recover(
    State(state): State<AppState>,
    Json(input): Json<RecoverRequest>,
) -> AppResult<impl IntoResponse> {
    let target: RecoveryTarget = input.status.parse()?;
    let affected = recovery::recover(state.store.as_ref(), target).await?;
    Ok(Json(DataResponse {
        data: RecoverResponse {
            status: target,
            affected,
        },
    }))
}

/// GET /api/v1/analysis/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.store.stats().await?;
    Ok(Json(DataResponse { data: stats }))
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/sensitivity
///
/// Returns `{safe, description}`. A backend failure is a 502; an answer
/// that cannot be parsed is reported as unsafe.
pub async fn check_sensitivity(
    State(state): State<AppState>,
    Json(input): Json<SensitivityRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let verdict = state.sensitivity.check(&input.text, &input.images).await?;
    Ok(Json(DataResponse { data: verdict }))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /api/v1/analysis/settings
pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.settings.load().await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/analysis/settings
///
/// Provider must be a known tag and model must be on the allow-list.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateSettings>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let current = state.settings.load().await?;

    let provider = match input.provider.as_deref() {
        Some(tag) => tag.parse::<ProviderKind>()?,
        None => current.provider,
    };
    let model = match input.model {
        Some(model) => {
            validate_model(&model)?;
            model
        }
        None => current.model,
    };

    let updated = AnalysisSettings {
        enabled: input.enabled.unwrap_or(current.enabled),
        provider,
        model,
    };
    let saved = state.settings.save(&updated).await?;

    tracing::info!(
        enabled = saved.enabled,
        provider = %saved.provider,
        model = %saved.model,
        "Analysis settings updated",
    );

    Ok(Json(DataResponse { data: saved }))
}
