//! Bulk CSV import endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pollhub_common::AppResult;
use pollhub_core::ImportReport;
use pollhub_core::import::RowError;
use pollhub_db::entities::bulk_upload::{self, UploadType};
use serde::{Deserialize, Serialize};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Run request: the CSV payload travels inline.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub upload_type: UploadType,
    pub file_name: String,
    pub content: String,
}

/// Start an import session and process it to completion.
async fn run(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> AppResult<ApiResponse<ImportReport>> {
    let report = state
        .import_service
        .run(&admin.id, req.upload_type, &req.file_name, &req.content)
        .await?;
    Ok(ApiResponse::ok(report))
}

/// Session listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Session response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: String,
    pub upload_type: UploadType,
    pub file_name: String,
    pub status: bulk_upload::UploadStatus,
    pub total_records: i32,
    pub successful_records: i32,
    pub failed_records: i32,
    pub errors: Vec<RowError>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<bulk_upload::Model> for UploadResponse {
    fn from(upload: bulk_upload::Model) -> Self {
        let errors = serde_json::from_value(upload.error_details).unwrap_or_default();
        Self {
            id: upload.id,
            upload_type: upload.upload_type,
            file_name: upload.file_name,
            status: upload.status,
            total_records: upload.total_records,
            successful_records: upload.successful_records,
            failed_records: upload.failed_records,
            errors,
            created_at: upload.created_at.to_rfc3339(),
            completed_at: upload.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Recent sessions, newest first.
async fn list(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<UploadResponse>>> {
    let limit = req.limit.min(100);
    let uploads = state.import_service.recent(limit, req.offset).await?;
    Ok(ApiResponse::ok(
        uploads.into_iter().map(Into::into).collect(),
    ))
}

/// Show request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequest {
    pub upload_id: String,
}

/// Show one session.
async fn show(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequest>,
) -> AppResult<ApiResponse<UploadResponse>> {
    let upload = state.import_service.get(&req.upload_id).await?;
    Ok(ApiResponse::ok(upload.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run", post(run))
        .route("/list", post(list))
        .route("/show", post(show))
}
