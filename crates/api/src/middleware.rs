//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use pollhub_core::{
    BookmarkService, ImportService, PollService, StatsService, UserService, VoteService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub poll_service: PollService,
    pub vote_service: VoteService,
    pub bookmark_service: BookmarkService,
    pub import_service: ImportService,
    pub stats_service: StatsService,
}

/// Authentication middleware: resolve `Authorization: Bearer` to a user
/// and stash it in request extensions for the extractors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
