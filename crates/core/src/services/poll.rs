//! Poll service: creation, listing, and the approval lifecycle.

use pollhub_common::{AppError, AppResult, IdGenerator};
use pollhub_db::{
    entities::{poll, user},
    repositories::{PollRepository, VoteRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use validator::Validate;

/// Fixed palette assigned to options by position.
const OPTION_COLORS: [&str; 6] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#f97316",
];

/// Color used when a poll somehow carries more options than the palette.
const OVERFLOW_COLOR: &str = "#6b7280";

/// Minimum and maximum number of options per poll.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// A single poll option as stored in the poll's `options` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    /// Slug derived from the option text; referenced by vote rows.
    pub id: String,
    /// Display text.
    pub text: String,
    /// Denormalized vote counter kept for display. Tallies are always
    /// recomputed from vote rows.
    #[serde(default)]
    pub votes: u64,
    /// Display color from the fixed palette.
    pub color: String,
}

/// Slug for an option text: lowercased, whitespace collapsed to `_`,
/// all other non-alphanumeric characters stripped.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Build option records from raw texts: slug ids and palette colors.
#[must_use]
pub fn build_options(texts: &[String]) -> Vec<PollOption> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let slug = slugify(text);
            PollOption {
                // An all-symbol text slugs to "", fall back to the position.
                id: if slug.is_empty() {
                    format!("option_{}", i + 1)
                } else {
                    slug
                },
                text: text.clone(),
                votes: 0,
                color: (*OPTION_COLORS.get(i).unwrap_or(&OVERFLOW_COLOR)).to_string(),
            }
        })
        .collect()
}

/// Decode a poll's stored options column, erroring on malformed data.
pub fn parse_options(poll: &poll::Model) -> AppResult<Vec<PollOption>> {
    serde_json::from_value(poll.options.clone())
        .map_err(|e| AppError::Internal(format!("Malformed options on poll {}: {e}", poll.id)))
}

/// Decode a poll's stored options column for display. Malformed data is
/// logged and rendered as an empty list so one bad row cannot take down
/// a whole listing.
#[must_use]
pub fn decode_options(poll: &poll::Model) -> Vec<PollOption> {
    match serde_json::from_value(poll.options.clone()) {
        Ok(options) => options,
        Err(e) => {
            tracing::warn!(poll_id = %poll.id, error = %e, "malformed options payload");
            Vec::new()
        }
    }
}

fn decode_tags(poll: &poll::Model) -> Vec<String> {
    match serde_json::from_value(poll.tags.clone()) {
        Ok(tags) => tags,
        Err(e) => {
            tracing::warn!(poll_id = %poll.id, error = %e, "malformed tags payload");
            Vec::new()
        }
    }
}

/// Input for creating or submitting a poll.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    /// Poll title.
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Category label, defaults to "General" when absent.
    pub category: Option<String>,
    /// Free-text tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Option texts, 2 to 6 entries.
    pub options: Vec<String>,
}

/// Input for editing a poll. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub options: Option<Vec<String>>,
}

/// A poll rendered for the listing: normalized fields plus the viewer's
/// vote status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub options: Vec<PollOption>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub user_has_voted: bool,
}

impl PollView {
    /// Render a poll model with normalized category, tags and options.
    #[must_use]
    pub fn from_poll(poll: &poll::Model, user_has_voted: bool) -> Self {
        Self {
            id: poll.id.clone(),
            title: poll.title.clone(),
            description: poll.description.clone(),
            category: poll
                .category
                .clone()
                .unwrap_or_else(|| "General".to_string()),
            options: decode_options(poll),
            tags: decode_tags(poll),
            is_active: poll.is_active,
            created_by: poll.created_by.clone(),
            created_at: poll.created_at,
            user_has_voted,
        }
    }
}

/// Poll service.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, vote_repo: VoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    fn validate_option_texts(texts: &[String]) -> AppResult<Vec<String>> {
        let texts: Vec<String> = texts
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.len() < MIN_OPTIONS || texts.len() > MAX_OPTIONS {
            return Err(AppError::Validation(format!(
                "A poll needs between {MIN_OPTIONS} and {MAX_OPTIONS} options, got {}",
                texts.len()
            )));
        }
        Ok(texts)
    }

    /// Create a poll. Admin-created polls are active immediately, polls
    /// submitted by regular users await approval.
    pub async fn create(
        &self,
        creator: &user::Model,
        input: CreatePollInput,
    ) -> AppResult<poll::Model> {
        input.validate()?;
        let texts = Self::validate_option_texts(&input.options)?;
        let options = build_options(&texts);

        let now = chrono::Utc::now();
        let model = poll::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            category: Set(input.category.filter(|c| !c.trim().is_empty())),
            options: Set(json!(options)),
            tags: Set(json!(input.tags)),
            is_active: Set(creator.is_admin()),
            created_by: Set(creator.id.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        self.poll_repo.create(model).await
    }

    /// Get a single poll by id.
    pub async fn get(&self, poll_id: &str) -> AppResult<poll::Model> {
        self.poll_repo.get_by_id(poll_id).await
    }

    /// Active polls, newest first, with polls the viewer has not voted on
    /// sorted ahead of polls they have. The sort is stable so recency is
    /// preserved within each group.
    pub async fn list_active(&self, viewer_id: Option<&str>) -> AppResult<Vec<PollView>> {
        let polls = self.poll_repo.find_active().await?;

        let voted: HashSet<String> = match viewer_id {
            Some(user_id) => self
                .vote_repo
                .find_by_user(user_id)
                .await?
                .into_iter()
                .map(|v| v.poll_id)
                .collect(),
            None => HashSet::new(),
        };

        let mut views: Vec<PollView> = polls
            .iter()
            .map(|p| PollView::from_poll(p, voted.contains(&p.id)))
            .collect();
        views.sort_by_key(|v| v.user_has_voted);
        Ok(views)
    }

    /// All polls, for the admin dashboard.
    pub async fn list_all(&self) -> AppResult<Vec<poll::Model>> {
        self.poll_repo.find_all().await
    }

    /// Pending submissions awaiting approval, oldest first.
    pub async fn list_pending(&self) -> AppResult<Vec<poll::Model>> {
        self.poll_repo.find_pending().await
    }

    /// Polls created by a given user.
    pub async fn list_by_creator(&self, user_id: &str) -> AppResult<Vec<poll::Model>> {
        self.poll_repo.find_by_creator(user_id).await
    }

    /// Edit a poll. Allowed for admins, and for the creator while the
    /// poll is still pending approval.
    pub async fn update(
        &self,
        actor: &user::Model,
        poll_id: &str,
        input: UpdatePollInput,
    ) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;

        let is_creator_pending = poll.created_by == actor.id && !poll.is_active;
        if !actor.is_admin() && !is_creator_pending {
            return Err(AppError::Forbidden(
                "Only the creator of a pending poll or an admin may edit it".to_string(),
            ));
        }

        let mut active: poll::ActiveModel = poll.into();
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("Title must not be empty".to_string()));
            }
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description).filter(|d| !d.trim().is_empty()));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category).filter(|c| !c.trim().is_empty()));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(json!(tags));
        }
        if let Some(texts) = input.options {
            let texts = Self::validate_option_texts(&texts)?;
            active.options = Set(json!(build_options(&texts)));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        self.poll_repo.update(active).await
    }

    /// Publish or unpublish a poll.
    pub async fn set_active(&self, poll_id: &str, is_active: bool) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let mut active: poll::ActiveModel = poll.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().into());
        self.poll_repo.update(active).await
    }

    /// Approve a pending submission.
    pub async fn approve(&self, poll_id: &str) -> AppResult<poll::Model> {
        self.set_active(poll_id, true).await
    }

    /// Reject a pending submission. Rejection deletes the poll.
    pub async fn reject(&self, poll_id: &str) -> AppResult<()> {
        self.poll_repo.get_by_id(poll_id).await?;
        self.poll_repo.delete(poll_id).await
    }

    /// Delete a poll and, via cascade, its votes and bookmarks.
    pub async fn delete(&self, poll_id: &str) -> AppResult<()> {
        self.poll_repo.get_by_id(poll_id).await?;
        self.poll_repo.delete(poll_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pollhub_db::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: &str, role: Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            email_lower: format!("{id}@example.com"),
            full_name: None,
            role,
            password_hash: None,
            token: None,
            bio: None,
            avatar_url: None,
            location: None,
            website: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_poll(id: &str, is_active: bool) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: format!("Poll {id}"),
            description: None,
            category: None,
            options: json!(build_options(&["Yes".to_string(), "No".to_string()])),
            tags: json!([]),
            is_active,
            created_by: "user1".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("JavaScript"), "javascript");
        assert_eq!(slugify("Very Satisfied"), "very_satisfied");
        assert_eq!(slugify("C++ / Rust"), "c__rust");
    }

    #[test]
    fn test_build_options_palette() {
        let texts: Vec<String> = (1..=7).map(|i| format!("Option {i}")).collect();
        let options = build_options(&texts);
        assert_eq!(options[0].color, "#3b82f6");
        assert_eq!(options[5].color, "#f97316");
        assert_eq!(options[6].color, "#6b7280");
        assert_eq!(options[0].id, "option_1");
        assert!(options.iter().all(|o| o.votes == 0));
    }

    #[test]
    fn test_decode_options_malformed_is_empty() {
        let mut poll = test_poll("poll1", true);
        poll.options = json!("not an array");
        assert!(decode_options(&poll).is_empty());
        assert!(parse_options(&poll).is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_single_option() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = PollService::new(
            PollRepository::new(db.clone()),
            VoteRepository::new(db),
        );

        let result = service
            .create(
                &test_user("admin1", Role::Admin),
                CreatePollInput {
                    title: "Lonely".to_string(),
                    description: None,
                    category: None,
                    tags: vec![],
                    options: vec!["Only".to_string(), "  ".to_string()],
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_active_sorts_unvoted_first() {
        let polls = vec![test_poll("poll1", true), test_poll("poll2", true)];
        let vote = pollhub_db::entities::vote::Model {
            id: "vote1".to_string(),
            poll_id: "poll1".to_string(),
            user_id: "user1".to_string(),
            option_id: "yes".to_string(),
            created_at: Utc::now().into(),
        };

        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([polls])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .into_connection(),
        );

        let service = PollService::new(
            PollRepository::new(poll_db),
            VoteRepository::new(vote_db),
        );

        let views = service.list_active(Some("user1")).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, "poll2");
        assert!(!views[0].user_has_voted);
        assert!(views[1].user_has_voted);
        assert_eq!(views[0].category, "General");
    }

    #[tokio::test]
    async fn test_update_forbidden_for_non_creator() {
        let poll = test_poll("poll1", true);
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll]])
                .into_connection(),
        );
        let vote_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = PollService::new(
            PollRepository::new(poll_db),
            VoteRepository::new(vote_db),
        );

        // Creator of an already-active poll can no longer edit it.
        let result = service
            .update(
                &test_user("user1", Role::User),
                "poll1",
                UpdatePollInput {
                    title: Some("New title".to_string()),
                    ..UpdatePollInput::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_reject_deletes() {
        let poll = test_poll("poll1", false);
        let poll_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let vote_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = PollService::new(
            PollRepository::new(poll_db),
            VoteRepository::new(vote_db),
        );

        service.reject("poll1").await.unwrap();
    }
}
