//! API integration tests.
//!
//! Endpoint-level tests over a mock database, exercising routing, the
//! auth middleware, and the error envelope.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use pollhub_api::{middleware::AppState, middleware::auth_middleware, router as api_router};
use pollhub_common::config::ImportConfig;
use pollhub_core::{
    BookmarkService, ImportService, PollService, StatsService, UserService, VoteService,
};
use pollhub_db::entities::{poll, user};
use pollhub_db::repositories::{
    BookmarkRepository, BulkUploadRepository, PollRepository, UserRepository, VoteRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn test_user(id: &str, role: user::Role) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        email_lower: format!("{id}@example.com"),
        full_name: Some("Test User".to_string()),
        role,
        password_hash: None,
        token: Some("testtoken".to_string()),
        bio: None,
        avatar_url: None,
        location: None,
        website: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_poll(id: &str) -> poll::Model {
    poll::Model {
        id: id.to_string(),
        title: "Favorite language?".to_string(),
        description: None,
        category: None,
        options: json!([
            {"id": "rust", "text": "Rust", "votes": 0, "color": "#3b82f6"},
            {"id": "go", "text": "Go", "votes": 0, "color": "#10b981"},
        ]),
        tags: json!([]),
        is_active: true,
        created_by: "user1".to_string(),
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// Build app state with every repository on one shared mock connection.
fn build_state(db: Arc<DatabaseConnection>) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let bookmark_repo = BookmarkRepository::new(Arc::clone(&db));
    let upload_repo = BulkUploadRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        poll_service: PollService::new(poll_repo.clone(), vote_repo.clone()),
        vote_service: VoteService::new(poll_repo.clone(), vote_repo.clone()),
        bookmark_service: BookmarkService::new(bookmark_repo.clone(), poll_repo.clone()),
        import_service: ImportService::new(
            user_repo.clone(),
            poll_repo.clone(),
            vote_repo.clone(),
            upload_repo,
            ImportConfig::default(),
        ),
        stats_service: StatsService::new(poll_repo, vote_repo, user_repo, bookmark_repo),
    }
}

fn create_router(db: MockDatabase) -> Router {
    let state = build_state(Arc::new(db.into_connection()));
    api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_with_token(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer testtoken")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_cast_without_token_returns_unauthorized() {
    let app = create_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(post("/votes/cast", json!({"pollId": "p1", "optionId": "rust"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert!(body.contains("UNAUTHORIZED"), "body: {body}");
}

#[tokio::test]
async fn test_bookmark_toggle_without_token_returns_unauthorized() {
    let app = create_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(post("/bookmarks/toggle", json!({"pollId": "p1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_polls_list_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_poll("p1")]]);
    let app = create_router(db);

    let response = app.oneshot(post("/polls/list", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("\"data\""), "body: {body}");
    assert!(body.contains("Favorite language?"), "body: {body}");
    // NULL category is normalized for display.
    assert!(body.contains("General"), "body: {body}");
}

#[tokio::test]
async fn test_signin_unknown_user_returns_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()]);
    let app = create_router(db);

    let response = app
        .oneshot(post(
            "/signin",
            json!({"email": "ghost@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_stats_rejects_regular_user() {
    // Token resolves to a non-admin account.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user("user1", user::Role::User)]]);
    let app = create_router(db);

    let response = app
        .oneshot(post_with_token("/admin/stats", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_stats_rejects_anonymous() {
    let app = create_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app.oneshot(post("/admin/stats", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cast_unknown_option_returns_bad_request() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user("user1", user::Role::User)]])
        .append_query_results([[test_poll("p1")]]);
    let app = create_router(db);

    let response = app
        .oneshot(post_with_token(
            "/votes/cast",
            json!({"pollId": "p1", "optionId": "python"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("VALIDATION_ERROR"), "body: {body}");
}

#[tokio::test]
async fn test_import_rejects_wrong_extension() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user("admin1", user::Role::Admin)]]);
    let app = create_router(db);

    let response = app
        .oneshot(post_with_token(
            "/admin/import/run",
            json!({
                "uploadType": "users",
                "fileName": "users.xlsx",
                "content": "email,full_name,role\n"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(post("/nonexistent", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
