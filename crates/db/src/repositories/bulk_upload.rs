//! Bulk upload session repository.

use std::sync::Arc;

use crate::entities::{BulkUpload, bulk_upload};
use pollhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Bulk upload session repository for database operations.
#[derive(Clone)]
pub struct BulkUploadRepository {
    db: Arc<DatabaseConnection>,
}

impl BulkUploadRepository {
    /// Create a new bulk upload repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<bulk_upload::Model>> {
        BulkUpload::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a session by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<bulk_upload::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bulk upload {id} not found")))
    }

    /// List sessions, newest first.
    pub async fn find_recent(&self, limit: u64, offset: u64) -> AppResult<Vec<bulk_upload::Model>> {
        BulkUpload::find()
            .order_by_desc(bulk_upload::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List sessions started by a user, newest first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<bulk_upload::Model>> {
        BulkUpload::find()
            .filter(bulk_upload::Column::UploadedBy.eq(user_id))
            .order_by_desc(bulk_upload::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(&self, model: bulk_upload::ActiveModel) -> AppResult<bulk_upload::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a session.
    pub async fn update(&self, model: bulk_upload::ActiveModel) -> AppResult<bulk_upload::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::bulk_upload::{UploadStatus, UploadType};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_session(id: &str) -> bulk_upload::Model {
        bulk_upload::Model {
            id: id.to_string(),
            uploaded_by: "admin1".to_string(),
            upload_type: UploadType::Polls,
            file_name: "polls.csv".to_string(),
            status: UploadStatus::Processing,
            total_records: 3,
            successful_records: 0,
            failed_records: 0,
            error_details: json!([]),
            created_at: Utc::now().into(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let session = create_test_session("s1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[session]])
                .into_connection(),
        );

        let repo = BulkUploadRepository::new(db);
        let result = repo.get_by_id("s1").await.unwrap();

        assert_eq!(result.file_name, "polls.csv");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<bulk_upload::Model>::new()])
                .into_connection(),
        );

        let repo = BulkUploadRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
