//! Bookmark endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// The caller's bookmarked poll ids.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<String>>> {
    let ids = state.bookmark_service.list(&user.id).await?;
    Ok(ApiResponse::ok(ids))
}

/// Toggle request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub poll_id: String,
}

/// Toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub poll_id: String,
    pub bookmarked: bool,
}

/// Toggle a bookmark, returning the resulting state.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let bookmarked = state.bookmark_service.toggle(&user.id, &req.poll_id).await?;
    Ok(ApiResponse::ok(ToggleResponse {
        poll_id: req.poll_id,
        bookmarked,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/toggle", post(toggle))
}
