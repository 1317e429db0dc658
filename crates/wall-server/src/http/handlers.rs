//! Route handlers
//!
//! Thin adapters: decode, validate, call one service, encode.

use crate::error::{ApiError, ResultExt};
use crate::http::dto::{
    ApplyFilterRequest, CreateSubmissionRequest, EngagementRequest, HealthResponse,
    ModerateRequest, ModerateResponse, SuccessResponse,
};
use crate::services::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use wall_core::{LeaderboardEntry, Submission};
use wall_imagen::FilteredImage;

const CREATE_FAILED: &str = "Failed to create submission";
const LIST_FAILED: &str = "Failed to fetch submissions";
const ENGAGE_FAILED: &str = "Failed to update engagement";
const LEADERBOARD_FAILED: &str = "Failed to fetch leaderboard";
const MODERATE_FAILED: &str = "Failed to moderate content";
const FILTER_FAILED: &str = "Failed to apply filter";

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub(crate) async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let rows = state.submissions.list().await.context(LIST_FAILED)?;
    Ok(Json(rows))
}

pub(crate) async fn create_submission(
    State(state): State<AppState>,
    payload: Result<Json<CreateSubmissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let Json(request) = payload?;
    let draft = request.validate().context(CREATE_FAILED)?;
    let row = state.submissions.create(&draft).await.context(CREATE_FAILED)?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub(crate) async fn toggle_engagement(
    State(state): State<AppState>,
    payload: Result<Json<EngagementRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let key = request.validate().context(ENGAGE_FAILED)?;
    state.engagements.toggle(&key).await.context(ENGAGE_FAILED)?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let entries = state.leaderboard.rank().await.context(LEADERBOARD_FAILED)?;
    Ok(Json(entries))
}

pub(crate) async fn moderate(
    State(state): State<AppState>,
    payload: Result<Json<ModerateRequest>, JsonRejection>,
) -> Result<Json<ModerateResponse>, ApiError> {
    let Json(request) = payload?;
    let (id, message) = request.validate().context(MODERATE_FAILED)?;
    let verdict = state
        .moderation
        .moderate(id, message)
        .await
        .context(MODERATE_FAILED)?;
    Ok(Json(ModerateResponse {
        status: verdict.status,
        is_flagged: verdict.is_flagged(),
    }))
}

pub(crate) async fn apply_filter(
    State(state): State<AppState>,
    payload: Result<Json<ApplyFilterRequest>, JsonRejection>,
) -> Result<Json<FilteredImage>, ApiError> {
    let Json(request) = payload?;
    let (image, filter) = request.validate().context(FILTER_FAILED)?;
    let filtered = state
        .filters
        .apply_filter(image, filter)
        .await
        .context(FILTER_FAILED)?;
    Ok(Json(filtered))
}
