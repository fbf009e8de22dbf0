//! Current-session account endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use pollhub_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Account profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for AccountResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: if user.role == user::Role::Admin {
                "admin".to_string()
            } else {
                "user".to_string()
            },
            bio: user.bio,
            avatar_url: user.avatar_url,
            location: user.location,
            website: user.website,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Current session.
async fn current(AuthUser(user): AuthUser) -> ApiResponse<AccountResponse> {
    ApiResponse::ok(user.into())
}

/// Profile update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Update the caller's profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<AccountResponse>> {
    let input = pollhub_core::user::UpdateProfileInput {
        full_name: req.full_name,
        bio: req.bio,
        avatar_url: req.avatar_url,
        location: req.location,
        website: req.website,
    };

    let updated = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/i", post(current))
        .route("/i/update", post(update))
}
