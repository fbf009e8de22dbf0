//! Overview statistics for the admin dashboard.

use pollhub_common::AppResult;
use pollhub_db::repositories::{
    BookmarkRepository, PollRepository, UserRepository, VoteRepository,
};
use serde::Serialize;

/// Instance-wide counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_polls: u64,
    pub active_polls: u64,
    pub pending_polls: u64,
    pub total_votes: u64,
    pub total_users: u64,
    pub total_bookmarks: u64,
}

/// Stats service.
#[derive(Clone)]
pub struct StatsService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
    user_repo: UserRepository,
    bookmark_repo: BookmarkRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        vote_repo: VoteRepository,
        user_repo: UserRepository,
        bookmark_repo: BookmarkRepository,
    ) -> Self {
        Self {
            poll_repo,
            vote_repo,
            user_repo,
            bookmark_repo,
        }
    }

    /// Compute the overview counters.
    pub async fn overview(&self) -> AppResult<OverviewStats> {
        let total_polls = self.poll_repo.count().await?;
        let active_polls = self.poll_repo.count_active().await?;
        Ok(OverviewStats {
            total_polls,
            active_polls,
            pending_polls: total_polls - active_polls,
            total_votes: self.vote_repo.count().await?,
            total_users: self.user_repo.count().await?,
            total_bookmarks: self.bookmark_repo.count().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn count_db(counts: &[i64]) -> Arc<sea_orm::DatabaseConnection> {
        let mut db = MockDatabase::new(DatabaseBackend::Postgres);
        for n in counts {
            db = db.append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(*n))
            }]]);
        }
        Arc::new(db.into_connection())
    }

    #[tokio::test]
    async fn test_overview_counts() {
        let poll_db = count_db(&[10, 7]);
        let vote_db = count_db(&[123]);
        let user_db = count_db(&[42]);
        let bookmark_db = count_db(&[5]);

        let service = StatsService::new(
            PollRepository::new(poll_db),
            VoteRepository::new(vote_db),
            UserRepository::new(user_db),
            BookmarkRepository::new(bookmark_db),
        );

        let stats = service.overview().await.unwrap();
        assert_eq!(stats.total_polls, 10);
        assert_eq!(stats.active_polls, 7);
        assert_eq!(stats.pending_polls, 3);
        assert_eq!(stats.total_votes, 123);
        assert_eq!(stats.total_users, 42);
        assert_eq!(stats.total_bookmarks, 5);
    }
}
