//! Bookmark repository.

use std::sync::Arc;

use crate::entities::{Bookmark, bookmark};
use pollhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Bookmark repository for database operations.
#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<DatabaseConnection>,
}

impl BookmarkRepository {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a bookmark by user and poll.
    pub async fn find_by_user_and_poll(
        &self,
        user_id: &str,
        poll_id: &str,
    ) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .filter(bookmark::Column::PollId.eq(poll_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a poll is bookmarked by user.
    pub async fn is_bookmarked(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_poll(user_id, poll_id)
            .await?
            .is_some())
    }

    /// Create a new bookmark.
    pub async fn create(&self, model: bookmark::ActiveModel) -> AppResult<bookmark::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a bookmark by user and poll.
    pub async fn delete_by_user_and_poll(&self, user_id: &str, poll_id: &str) -> AppResult<()> {
        Bookmark::delete_many()
            .filter(bookmark::Column::UserId.eq(user_id))
            .filter(bookmark::Column::PollId.eq(poll_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a user's bookmarks, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .order_by_desc(bookmark::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count bookmarks for a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all bookmarks.
    pub async fn count(&self) -> AppResult<u64> {
        Bookmark::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
