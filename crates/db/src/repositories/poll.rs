//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, poll};
use pollhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// Find a poll by exact title. Used by bulk vote import.
    pub async fn find_by_title(&self, title: &str) -> AppResult<Option<poll::Model>> {
        Poll::find()
            .filter(poll::Column::Title.eq(title))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active polls, newest first.
    pub async fn find_active(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::IsActive.eq(true))
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all polls regardless of state, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List polls awaiting approval, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::IsActive.eq(false))
            .order_by_asc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List polls created by a user, newest first.
    pub async fn find_by_creator(&self, user_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::CreatedBy.eq(user_id))
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create many polls in batched statements. Used by bulk import.
    pub async fn create_many(&self, models: Vec<poll::ActiveModel>) -> AppResult<()> {
        for chunk in models.chunks(super::INSERT_CHUNK_SIZE) {
            Poll::insert_many(chunk.to_vec())
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Update a poll.
    pub async fn update(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a poll.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all polls.
    pub async fn count(&self) -> AppResult<u64> {
        Poll::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active polls.
    pub async fn count_active(&self) -> AppResult<u64> {
        Poll::find()
            .filter(poll::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
