//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Session response: account identity plus the bearer token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub token: String,
}

fn session_response(user: pollhub_db::entities::user::Model) -> SessionResponse {
    SessionResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: if user.role == pollhub_db::entities::user::Role::Admin {
            "admin".to_string()
        } else {
            "user".to_string()
        },
        token: user.token.unwrap_or_default(),
    }
}

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let input = pollhub_core::user::SignupInput {
        email: req.email,
        password: req.password,
        full_name: req.full_name,
    };

    let user = state.user_service.signup(input).await?;
    Ok(ApiResponse::ok(session_response(user)))
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.user_service.signin(&req.email, &req.password).await?;
    Ok(ApiResponse::ok(session_response(user)))
}

/// Regenerate token response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateTokenResponse {
    pub token: String,
}

/// Issue a fresh token, invalidating all existing sessions.
async fn regenerate_token(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RegenerateTokenResponse>> {
    let user = state.user_service.regenerate_token(&user.id).await?;
    Ok(ApiResponse::ok(RegenerateTokenResponse {
        token: user.token.unwrap_or_default(),
    }))
}

/// Signout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out by rotating the token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SignoutResponse>> {
    state.user_service.regenerate_token(&user.id).await?;
    Ok(ApiResponse::ok(SignoutResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/regenerate-token", post(regenerate_token))
}
