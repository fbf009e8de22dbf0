//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use pollhub_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::OnConflict,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's ballot for a poll (zero or one row).
    pub async fn find_by_poll_and_user(
        &self,
        poll_id: &str,
        user_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all ballots for a poll.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all ballots cast by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a ballot, or replace the option of the existing ballot for the
    /// same (poll, user). The unique index on (poll_id, user_id) makes this
    /// atomic: concurrent casts from the same user cannot produce duplicates.
    pub async fn upsert(&self, model: vote::ActiveModel) -> AppResult<()> {
        Vote::insert(model)
            .on_conflict(
                OnConflict::columns([vote::Column::PollId, vote::Column::UserId])
                    .update_column(vote::Column::OptionId)
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert many ballots in batched statements, replacing existing ballots
    /// for colliding (poll, user) pairs. Used by bulk import.
    pub async fn upsert_many(&self, models: Vec<vote::ActiveModel>) -> AppResult<()> {
        for chunk in models.chunks(super::INSERT_CHUNK_SIZE) {
            Vote::insert_many(chunk.to_vec())
                .on_conflict(
                    OnConflict::columns([vote::Column::PollId, vote::Column::UserId])
                        .update_column(vote::Column::OptionId)
                        .to_owned(),
                )
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Count ballots for a poll.
    pub async fn count_by_poll(&self, poll_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all ballots.
    pub async fn count(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
