//! API endpoints.

mod account;
mod admin;
mod auth;
mod bookmarks;
mod import;
mod polls;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(account::router())
        .nest("/polls", polls::router())
        .nest("/votes", votes::router())
        .nest("/bookmarks", bookmarks::router())
        .nest("/admin", admin::router())
}
