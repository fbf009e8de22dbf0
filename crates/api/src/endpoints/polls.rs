//! Poll endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use pollhub_core::{CreatePollInput, PollView, UpdatePollInput, VoteView};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Active polls, unvoted first for an authenticated viewer.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollView>>> {
    let views = state
        .poll_service
        .list_active(viewer.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(ApiResponse::ok(views))
}

/// Show request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequest {
    pub poll_id: String,
}

/// A poll plus its vote state for the viewer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollShowResponse {
    pub poll: PollView,
    #[serde(flatten)]
    pub votes: VoteView,
}

/// Show one poll with its tally.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequest>,
) -> AppResult<ApiResponse<PollShowResponse>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let poll = state.poll_service.get(&req.poll_id).await?;
    let votes = state.vote_service.show(&req.poll_id, viewer_id).await?;
    let view = PollView::from_poll(&poll, votes.user_vote.is_some());
    Ok(ApiResponse::ok(PollShowResponse { poll: view, votes }))
}

/// Create (or, for regular users, submit) a poll. Admin polls go live
/// immediately; user submissions await approval.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePollInput>,
) -> AppResult<ApiResponse<PollView>> {
    let poll = state.poll_service.create(&user, req).await?;
    Ok(ApiResponse::ok(PollView::from_poll(&poll, false)))
}

/// Update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub poll_id: String,
    #[serde(flatten)]
    pub changes: UpdatePollInput,
}

/// Edit a poll (creator pre-approval, or admin).
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> AppResult<ApiResponse<PollView>> {
    let poll = state
        .poll_service
        .update(&user, &req.poll_id, req.changes)
        .await?;
    Ok(ApiResponse::ok(PollView::from_poll(&poll, false)))
}

/// Polls the caller created, any status.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollView>>> {
    let polls = state.poll_service.list_by_creator(&user.id).await?;
    Ok(ApiResponse::ok(
        polls.iter().map(|p| PollView::from_poll(p, false)).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/mine", post(mine))
}
