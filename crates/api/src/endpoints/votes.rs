//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use pollhub_core::VoteView;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Show request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequest {
    pub poll_id: String,
}

/// The viewer's ballot and the tally for a poll.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequest>,
) -> AppResult<ApiResponse<VoteView>> {
    let view = state
        .vote_service
        .show(&req.poll_id, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(ApiResponse::ok(view))
}

/// Cast request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRequest {
    pub poll_id: String,
    pub option_id: String,
}

/// Cast or change the caller's ballot.
async fn cast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastRequest>,
) -> AppResult<ApiResponse<VoteView>> {
    let view = state
        .vote_service
        .cast(&user.id, &req.poll_id, &req.option_id)
        .await?;
    Ok(ApiResponse::ok(view))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/cast", post(cast))
}
