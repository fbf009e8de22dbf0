//! Vote service: ballots and tallies.

use pollhub_common::{AppError, AppResult, IdGenerator};
use pollhub_db::{
    entities::vote,
    repositories::{PollRepository, VoteRepository},
};
use sea_orm::Set;
use serde::Serialize;
use std::collections::HashMap;

use crate::services::poll::parse_options;

/// A poll's vote state as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    /// Option the viewer voted for, if any.
    pub user_vote: Option<String>,
    /// Ballot count per option id, tallied from vote rows.
    pub tally: HashMap<String, u64>,
    /// Total number of ballots on the poll.
    pub total_votes: u64,
}

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, vote_repo: VoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Tally ballots per option id.
    pub async fn tally(&self, poll_id: &str) -> AppResult<HashMap<String, u64>> {
        let votes = self.vote_repo.find_by_poll(poll_id).await?;
        let mut tally: HashMap<String, u64> = HashMap::new();
        for vote in votes {
            *tally.entry(vote.option_id).or_insert(0) += 1;
        }
        Ok(tally)
    }

    /// The poll's tally plus the viewer's own ballot.
    pub async fn show(&self, poll_id: &str, viewer_id: Option<&str>) -> AppResult<VoteView> {
        self.poll_repo.get_by_id(poll_id).await?;

        let user_vote = match viewer_id {
            Some(user_id) => self
                .vote_repo
                .find_by_poll_and_user(poll_id, user_id)
                .await?
                .map(|v| v.option_id),
            None => None,
        };

        let tally = self.tally(poll_id).await?;
        let total_votes = tally.values().sum();
        Ok(VoteView {
            user_vote,
            tally,
            total_votes,
        })
    }

    /// Cast (or change) the user's ballot. The write is an atomic upsert
    /// keyed on (poll_id, user_id), so a second cast replaces the first
    /// even across concurrent sessions.
    pub async fn cast(
        &self,
        user_id: &str,
        poll_id: &str,
        option_id: &str,
    ) -> AppResult<VoteView> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        if !poll.is_active {
            return Err(AppError::BadRequest(
                "Poll is not open for voting".to_string(),
            ));
        }

        let options = parse_options(&poll)?;
        if !options.iter().any(|o| o.id == option_id) {
            return Err(AppError::Validation(format!(
                "Unknown option '{option_id}' for poll {poll_id}"
            )));
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(poll_id.to_string()),
            user_id: Set(user_id.to_string()),
            option_id: Set(option_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.vote_repo.upsert(model).await?;

        // Re-read after the write so the caller sees the refreshed state.
        let tally = self.tally(poll_id).await?;
        let total_votes = tally.values().sum();
        Ok(VoteView {
            user_vote: Some(option_id.to_string()),
            tally,
            total_votes,
        })
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

    fn test_poll(id: &str, is_active: bool) -> poll::Model {
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
            is_active,
            created_by: "user1".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn test_vote(id: &str, poll_id: &str, user_id: &str, option_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            poll_id: poll_id.to_string(),
            user_id: user_id.to_string(),
            option_id: option_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_tally_counts_rows_per_option() {
        let votes = vec![
            test_vote("v1", "poll1", "user1", "rust"),
            test_vote("v2", "poll1", "user2", "rust"),
            test_vote("v3", "poll1", "user3", "go"),
        ];
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([votes])
                .into_connection(),
        );
        let poll_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(PollRepository::new(poll_db), VoteRepository::new(vote_db));

        let tally = service.tally("poll1").await.unwrap();
        assert_eq!(tally.get("rust"), Some(&2));
        assert_eq!(tally.get("go"), Some(&1));
    }

    #[tokio::test]
    async fn test_cast_rejects_inactive_poll() {
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_poll("poll1", false)]])
                .into_connection(),
        );
        let vote_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(PollRepository::new(poll_db), VoteRepository::new(vote_db));

        let result = service.cast("user1", "poll1", "rust").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cast_rejects_unknown_option() {
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_poll("poll1", true)]])
                .into_connection(),
        );
        let vote_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(PollRepository::new(poll_db), VoteRepository::new(vote_db));

        let result = service.cast("user1", "poll1", "python").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cast_upserts_and_returns_refreshed_tally() {
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_poll("poll1", true)]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                // One result for the upsert's RETURNING, one for the tally.
                .append_query_results([[test_vote("v1", "poll1", "user1", "go")]])
                .append_query_results([[test_vote("v1", "poll1", "user1", "go")]])
                .into_connection(),
        );
        let service = VoteService::new(PollRepository::new(poll_db), VoteRepository::new(vote_db));

        let view = service.cast("user1", "poll1", "go").await.unwrap();
        assert_eq!(view.user_vote.as_deref(), Some("go"));
        assert_eq!(view.total_votes, 1);
        assert_eq!(view.tally.get("go"), Some(&1));
    }
}
