//! Admin endpoints: poll lifecycle, stats, and user listing.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use pollhub_core::{OverviewStats, PollView};
use serde::{Deserialize, Serialize};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

use super::import;

/// Poll id request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollIdRequest {
    pub poll_id: String,
}

/// All polls, any status.
async fn list_polls(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollView>>> {
    let polls = state.poll_service.list_all().await?;
    Ok(ApiResponse::ok(
        polls.iter().map(|p| PollView::from_poll(p, false)).collect(),
    ))
}

/// Submissions awaiting approval, oldest first.
async fn pending_polls(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollView>>> {
    let polls = state.poll_service.list_pending().await?;
    Ok(ApiResponse::ok(
        polls.iter().map(|p| PollView::from_poll(p, false)).collect(),
    ))
}

/// Approve a pending submission.
async fn approve_poll(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollView>> {
    let poll = state.poll_service.approve(&req.poll_id).await?;
    Ok(ApiResponse::ok(PollView::from_poll(&poll, false)))
}

/// Reject (and delete) a pending submission.
async fn reject_poll(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.poll_service.reject(&req.poll_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Set-active request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub poll_id: String,
    pub is_active: bool,
}

/// Publish or unpublish a poll.
async fn set_poll_active(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<ApiResponse<PollView>> {
    let poll = state
        .poll_service
        .set_active(&req.poll_id, req.is_active)
        .await?;
    Ok(ApiResponse::ok(PollView::from_poll(&poll, false)))
}

/// Delete a poll outright.
async fn delete_poll(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.poll_service.delete(&req.poll_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Instance-wide counters.
async fn stats(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<OverviewStats>> {
    let stats = state.stats_service.overview().await?;
    Ok(ApiResponse::ok(stats))
}

/// User listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

/// User listing entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: String,
}

/// List accounts, paginated.
async fn list_users(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ListUsersRequest>,
) -> AppResult<ApiResponse<Vec<UserEntry>>> {
    let limit = req.limit.min(200);
    let users = state.user_service.list(limit, req.offset).await?;
    Ok(ApiResponse::ok(
        users
            .into_iter()
            .map(|u| {
                let role = if u.is_admin() {
                    "admin".to_string()
                } else {
                    "user".to_string()
                };
                UserEntry {
                    id: u.id,
                    email: u.email,
                    full_name: u.full_name,
                    role,
                    created_at: u.created_at.to_rfc3339(),
                }
            })
            .collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/polls/list", post(list_polls))
        .route("/polls/pending", post(pending_polls))
        .route("/polls/approve", post(approve_poll))
        .route("/polls/reject", post(reject_poll))
        .route("/polls/set-active", post(set_poll_active))
        .route("/polls/delete", post(delete_poll))
        .route("/stats", post(stats))
        .route("/users/list", post(list_users))
        .nest("/import", import::router())
}
