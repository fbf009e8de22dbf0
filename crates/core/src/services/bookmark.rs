//! Bookmark service.

use pollhub_common::{AppResult, IdGenerator};
use pollhub_db::{
    entities::bookmark,
    repositories::{BookmarkRepository, PollRepository},
};
use sea_orm::Set;

/// Bookmark service: set semantics over (user, poll).
#[derive(Clone)]
pub struct BookmarkService {
    bookmark_repo: BookmarkRepository,
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

impl BookmarkService {
    /// Create a new bookmark service.
    #[must_use]
    pub const fn new(bookmark_repo: BookmarkRepository, poll_repo: PollRepository) -> Self {
        Self {
            bookmark_repo,
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// The poll ids the user has bookmarked.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .bookmark_repo
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(|b| b.poll_id)
            .collect())
    }

    /// Toggle a bookmark. Returns the resulting state: `true` when the
    /// poll is now bookmarked. A duplicate insert lost to a concurrent
    /// toggle is stopped by the unique index.
    pub async fn toggle(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        self.poll_repo.get_by_id(poll_id).await?;

        if self.bookmark_repo.is_bookmarked(user_id, poll_id).await? {
            self.bookmark_repo
                .delete_by_user_and_poll(user_id, poll_id)
                .await?;
            return Ok(false);
        }

        let model = bookmark::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            poll_id: Set(poll_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.bookmark_repo.create(model).await?;
        Ok(true)
    }

    /// Whether the user has bookmarked the poll.
    pub async fn is_bookmarked(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        self.bookmark_repo.is_bookmarked(user_id, poll_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pollhub_db::entities::poll;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn test_poll(id: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: "Poll".to_string(),
            description: None,
            category: None,
            options: json!([]),
            tags: json!([]),
            is_active: true,
            created_by: "user1".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn test_bookmark(id: &str, user_id: &str, poll_id: &str) -> bookmark::Model {
        bookmark::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            poll_id: poll_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_toggle_on() {
        let created = test_bookmark("bm1", "user1", "poll1");
        let bookmark_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<bookmark::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_poll("poll1")]])
                .into_connection(),
        );
        let service =
            BookmarkService::new(BookmarkRepository::new(bookmark_db), PollRepository::new(poll_db));

        let bookmarked = service.toggle("user1", "poll1").await.unwrap();
        assert!(bookmarked);
    }

    #[tokio::test]
    async fn test_toggle_off() {
        let existing = test_bookmark("bm1", "user1", "poll1");
        let bookmark_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_poll("poll1")]])
                .into_connection(),
        );
        let service =
            BookmarkService::new(BookmarkRepository::new(bookmark_db), PollRepository::new(poll_db));

        let bookmarked = service.toggle("user1", "poll1").await.unwrap();
        assert!(!bookmarked);
    }

    #[tokio::test]
    async fn test_list_returns_poll_ids() {
        let bookmarks = vec![
            test_bookmark("bm1", "user1", "poll1"),
            test_bookmark("bm2", "user1", "poll2"),
        ];
        let bookmark_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([bookmarks])
                .into_connection(),
        );
        let poll_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service =
            BookmarkService::new(BookmarkRepository::new(bookmark_db), PollRepository::new(poll_db));

        let ids = service.list("user1").await.unwrap();
        assert_eq!(ids, vec!["poll1".to_string(), "poll2".to_string()]);
    }
}
