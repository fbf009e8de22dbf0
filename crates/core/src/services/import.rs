//! Bulk CSV import: users, polls, votes, and synthetic vote seeding.

use pollhub_common::{AppError, AppResult, IdGenerator, config::ImportConfig};
use pollhub_db::{
    entities::{
        bulk_upload::{self, UploadStatus, UploadType},
        poll, user, vote,
    },
    repositories::{BulkUploadRepository, PollRepository, UserRepository, VoteRepository},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use validator::ValidateEmail;

use crate::csv::{self, CsvDocument};
use crate::services::poll::{MIN_OPTIONS, PollOption, build_options, parse_options};

/// Option columns in the poll CSV schema: `option1` through `option5`.
const POLL_CSV_OPTION_COLUMNS: usize = 5;

/// One rejected CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number in the uploaded file.
    pub line: usize,
    pub message: String,
}

impl RowError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Outcome of one import session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub upload_id: String,
    pub status: UploadStatus,
    pub total_records: i32,
    pub successful_records: i32,
    pub failed_records: i32,
    pub errors: Vec<RowError>,
}

/// How synthetic ballots are spread across a poll's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Distribution {
    Equal,
    Weighted,
    Random,
}

impl Distribution {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "equal" => Some(Self::Equal),
            "weighted" => Some(Self::Weighted),
            "" | "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Pick an option index for the `i`-th synthetic ballot.
///
/// `weighted` puts the first option at probability 0.4 and the second at
/// 0.3, spreading the rest uniformly over the remaining options (with two
/// options the remainder collapses onto the second).
fn sample_option<R: Rng>(dist: Distribution, i: usize, n_options: usize, rng: &mut R) -> usize {
    match dist {
        Distribution::Equal => i % n_options,
        Distribution::Random => rng.gen_range(0..n_options),
        Distribution::Weighted => {
            let r: f64 = rng.r#gen();
            if r < 0.4 {
                0
            } else if r < 0.7 || n_options == 2 {
                1
            } else {
                rng.gen_range(2..n_options)
            }
        }
    }
}

struct ParsedUser {
    email: String,
    full_name: Option<String>,
    role: user::Role,
}

struct ParsedPoll {
    title: String,
    description: Option<String>,
    category: Option<String>,
    options: Vec<PollOption>,
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Validate user rows: email format, role vocabulary, in-file duplicates.
fn parse_user_rows(doc: &CsvDocument) -> (Vec<(usize, ParsedUser)>, Vec<RowError>) {
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in &doc.rows {
        let email = row.get("email");
        if !email.validate_email() {
            errors.push(RowError::new(row.line, format!("Invalid email '{email}'")));
            continue;
        }
        if !seen.insert(email.to_lowercase()) {
            errors.push(RowError::new(
                row.line,
                format!("Duplicate email '{email}' in file"),
            ));
            continue;
        }
        let role = match row.get("role") {
            "" | "user" => user::Role::User,
            "admin" => user::Role::Admin,
            other => {
                errors.push(RowError::new(row.line, format!("Unknown role '{other}'")));
                continue;
            }
        };
        parsed.push((
            row.line,
            ParsedUser {
                email: email.to_string(),
                full_name: optional(row.get("full_name")),
                role,
            },
        ));
    }
    (parsed, errors)
}

/// Validate poll rows: title plus at least two non-empty options out of
/// the `option1..option5` columns.
fn parse_poll_rows(doc: &CsvDocument) -> (Vec<ParsedPoll>, Vec<RowError>) {
    let mut parsed = Vec::new();
    let mut errors = Vec::new();

    for row in &doc.rows {
        if !row.has("title") {
            errors.push(RowError::new(row.line, "Missing title"));
            continue;
        }
        let texts: Vec<String> = (1..=POLL_CSV_OPTION_COLUMNS)
            .map(|i| row.get(&format!("option{i}")).to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.len() < MIN_OPTIONS {
            errors.push(RowError::new(
                row.line,
                format!(
                    "A poll needs at least {MIN_OPTIONS} options, got {}",
                    texts.len()
                ),
            ));
            continue;
        }
        parsed.push(ParsedPoll {
            title: row.get("title").to_string(),
            description: optional(row.get("description")),
            category: optional(row.get("category")),
            options: build_options(&texts),
        });
    }
    (parsed, errors)
}

/// Bulk import service. Admin-only; the capability check sits at the API
/// boundary.
#[derive(Clone)]
pub struct ImportService {
    user_repo: UserRepository,
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
    upload_repo: BulkUploadRepository,
    config: ImportConfig,
    id_gen: IdGenerator,
}

impl ImportService {
    /// Create a new import service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        poll_repo: PollRepository,
        vote_repo: VoteRepository,
        upload_repo: BulkUploadRepository,
        config: ImportConfig,
    ) -> Self {
        Self {
            user_repo,
            poll_repo,
            vote_repo,
            upload_repo,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Run one import session end to end. Row failures are recorded in the
    /// session's error details rather than failing the request; the session
    /// ends `completed`, `partial`, or `failed`.
    pub async fn run(
        &self,
        admin_id: &str,
        upload_type: UploadType,
        file_name: &str,
        content: &str,
    ) -> AppResult<ImportReport> {
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(AppError::Validation(
                "Only .csv files are accepted".to_string(),
            ));
        }
        if content.len() > self.config.max_file_size {
            return Err(AppError::Validation(format!(
                "File exceeds the {} byte limit",
                self.config.max_file_size
            )));
        }

        let session = self
            .upload_repo
            .create(bulk_upload::ActiveModel {
                id: Set(self.id_gen.generate()),
                uploaded_by: Set(admin_id.to_string()),
                upload_type: Set(upload_type),
                file_name: Set(file_name.to_string()),
                status: Set(UploadStatus::Processing),
                total_records: Set(0),
                successful_records: Set(0),
                failed_records: Set(0),
                error_details: Set(json!([])),
                created_at: Set(chrono::Utc::now().into()),
                completed_at: Set(None),
            })
            .await?;

        let doc = match csv::parse(content) {
            Ok(doc) => doc,
            Err(message) => {
                let error = RowError::new(1, message);
                return self
                    .finish(session, UploadStatus::Failed, 0, 0, vec![error])
                    .await;
            }
        };
        let total = doc.rows.len() as i32;

        let outcome = match upload_type {
            UploadType::Users => self.import_users(&doc).await,
            UploadType::Polls => self.import_polls(admin_id, &doc).await,
            UploadType::Votes => self.import_votes(&doc).await,
            UploadType::RandomVotes => self.import_random_votes(&doc).await,
        };

        match outcome {
            Ok((successful, errors)) => {
                let status = if successful == 0 && !errors.is_empty() {
                    UploadStatus::Failed
                } else if errors.is_empty() {
                    UploadStatus::Completed
                } else {
                    UploadStatus::PartiallyCompleted
                };
                self.finish(session, status, total, successful, errors).await
            }
            Err(e) => {
                tracing::error!(upload_id = %session.id, error = %e, "import session failed");
                let error = RowError::new(1, e.to_string());
                self.finish(session, UploadStatus::Failed, total, 0, vec![error])
                    .await
            }
        }
    }

    async fn finish(
        &self,
        session: bulk_upload::Model,
        status: UploadStatus,
        total: i32,
        successful: i32,
        errors: Vec<RowError>,
    ) -> AppResult<ImportReport> {
        let failed = errors.len() as i32;
        let mut active: bulk_upload::ActiveModel = session.into();
        active.status = Set(status.clone());
        active.total_records = Set(total);
        active.successful_records = Set(successful);
        active.failed_records = Set(failed);
        active.error_details = Set(json!(errors));
        active.completed_at = Set(Some(chrono::Utc::now().into()));
        let updated = self.upload_repo.update(active).await?;

        Ok(ImportReport {
            upload_id: updated.id,
            status,
            total_records: total,
            successful_records: successful,
            failed_records: failed,
            errors,
        })
    }

    /// Recent import sessions for the admin dashboard.
    pub async fn recent(&self, limit: u64, offset: u64) -> AppResult<Vec<bulk_upload::Model>> {
        self.upload_repo.find_recent(limit, offset).await
    }

    /// Look up one session.
    pub async fn get(&self, upload_id: &str) -> AppResult<bulk_upload::Model> {
        self.upload_repo.get_by_id(upload_id).await
    }

    async fn import_users(&self, doc: &CsvDocument) -> AppResult<(i32, Vec<RowError>)> {
        let (parsed, mut errors) = parse_user_rows(doc);

        // One batched lookup for already-registered addresses.
        let emails: Vec<String> = parsed.iter().map(|(_, u)| u.email.clone()).collect();
        let existing: HashSet<String> = self
            .user_repo
            .find_by_emails(&emails)
            .await?
            .into_iter()
            .map(|u| u.email_lower)
            .collect();

        let now = chrono::Utc::now();
        let mut models = Vec::new();
        for (line, parsed_user) in parsed {
            if existing.contains(&parsed_user.email.to_lowercase()) {
                errors.push(RowError::new(
                    line,
                    format!("Email '{}' is already registered", parsed_user.email),
                ));
                continue;
            }
            models.push(user::ActiveModel {
                id: Set(self.id_gen.generate()),
                email: Set(parsed_user.email.clone()),
                email_lower: Set(parsed_user.email.to_lowercase()),
                full_name: Set(parsed_user.full_name),
                role: Set(parsed_user.role),
                // Imported accounts finish signup on first signin.
                password_hash: Set(None),
                token: Set(None),
                bio: Set(None),
                avatar_url: Set(None),
                location: Set(None),
                website: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(None),
            });
        }

        let successful = models.len() as i32;
        self.user_repo.create_many(models).await?;
        Ok((successful, errors))
    }

    async fn import_polls(
        &self,
        admin_id: &str,
        doc: &CsvDocument,
    ) -> AppResult<(i32, Vec<RowError>)> {
        let (parsed, errors) = parse_poll_rows(doc);

        let now = chrono::Utc::now();
        let models: Vec<poll::ActiveModel> = parsed
            .into_iter()
            .map(|p| poll::ActiveModel {
                id: Set(self.id_gen.generate()),
                title: Set(p.title),
                description: Set(p.description),
                category: Set(p.category),
                options: Set(json!(p.options)),
                tags: Set(json!([])),
                // Imported by an admin, so published immediately.
                is_active: Set(true),
                created_by: Set(admin_id.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .collect();

        let successful = models.len() as i32;
        self.poll_repo.create_many(models).await?;
        Ok((successful, errors))
    }

    async fn poll_by_title(
        &self,
        cache: &mut HashMap<String, Option<(poll::Model, Vec<PollOption>)>>,
        title: &str,
    ) -> AppResult<Option<(poll::Model, Vec<PollOption>)>> {
        if let Some(hit) = cache.get(title) {
            return Ok(hit.clone());
        }
        let found = match self.poll_repo.find_by_title(title).await? {
            Some(p) => {
                let options = parse_options(&p)?;
                Some((p, options))
            }
            None => None,
        };
        cache.insert(title.to_string(), found.clone());
        Ok(found)
    }

    async fn import_votes(&self, doc: &CsvDocument) -> AppResult<(i32, Vec<RowError>)> {
        let mut errors = Vec::new();
        let mut polls: HashMap<String, Option<(poll::Model, Vec<PollOption>)>> = HashMap::new();
        let mut users: HashMap<String, Option<user::Model>> = HashMap::new();
        // Last ballot per (poll, user) wins, mirroring the upsert.
        let mut ballots: HashMap<(String, String), vote::ActiveModel> = HashMap::new();

        let now = chrono::Utc::now();
        for row in &doc.rows {
            let title = row.get("poll_title");
            let email = row.get("user_email");
            let option_text = row.get("option_text");
            if title.is_empty() || email.is_empty() || option_text.is_empty() {
                errors.push(RowError::new(
                    row.line,
                    "poll_title, user_email and option_text are required",
                ));
                continue;
            }

            let Some((poll, options)) = self.poll_by_title(&mut polls, title).await? else {
                errors.push(RowError::new(row.line, format!("Poll '{title}' not found")));
                continue;
            };

            let email_lower = email.to_lowercase();
            let user = match users.get(&email_lower) {
                Some(hit) => hit.clone(),
                None => {
                    let found = self.user_repo.find_by_email(email).await?;
                    users.insert(email_lower.clone(), found.clone());
                    found
                }
            };
            let Some(user) = user else {
                errors.push(RowError::new(row.line, format!("User '{email}' not found")));
                continue;
            };

            let Some(option) = options
                .iter()
                .find(|o| o.text.eq_ignore_ascii_case(option_text))
            else {
                errors.push(RowError::new(
                    row.line,
                    format!("Option '{option_text}' not found on poll '{title}'"),
                ));
                continue;
            };

            ballots.insert(
                (poll.id.clone(), user.id.clone()),
                vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    poll_id: Set(poll.id.clone()),
                    user_id: Set(user.id.clone()),
                    option_id: Set(option.id.clone()),
                    created_at: Set(now.into()),
                },
            );
        }

        let successful = ballots.len() as i32;
        self.vote_repo
            .upsert_many(ballots.into_values().collect())
            .await?;
        Ok((successful, errors))
    }

    async fn import_random_votes(&self, doc: &CsvDocument) -> AppResult<(i32, Vec<RowError>)> {
        let mut errors = Vec::new();
        let mut polls: HashMap<String, Option<(poll::Model, Vec<PollOption>)>> = HashMap::new();
        let mut rng = StdRng::from_entropy();
        let mut successful = 0_i32;

        for row in &doc.rows {
            let title = row.get("poll_title");
            let Some((poll, options)) = self.poll_by_title(&mut polls, title).await? else {
                errors.push(RowError::new(row.line, format!("Poll '{title}' not found")));
                continue;
            };
            if options.len() < MIN_OPTIONS {
                errors.push(RowError::new(
                    row.line,
                    format!("Poll '{title}' has no options to distribute over"),
                ));
                continue;
            }

            let total: usize = match row.get("total_votes").parse() {
                Ok(n) if n > 0 && n <= self.config.max_random_votes as usize => n,
                Ok(_) => {
                    errors.push(RowError::new(
                        row.line,
                        format!(
                            "total_votes must be between 1 and {}",
                            self.config.max_random_votes
                        ),
                    ));
                    continue;
                }
                Err(_) => {
                    errors.push(RowError::new(row.line, "total_votes must be a number"));
                    continue;
                }
            };

            let Some(dist) = Distribution::parse(row.get("distribution_type")) else {
                errors.push(RowError::new(
                    row.line,
                    format!(
                        "Unknown distribution_type '{}'",
                        row.get("distribution_type")
                    ),
                ));
                continue;
            };

            self.seed_ballots(&poll, &options, total, dist, &mut rng)
                .await?;
            successful += 1;
        }

        Ok((successful, errors))
    }

    /// Create `total` synthetic voter accounts and one ballot each.
    async fn seed_ballots<R: Rng>(
        &self,
        poll: &poll::Model,
        options: &[PollOption],
        total: usize,
        dist: Distribution,
        rng: &mut R,
    ) -> AppResult<()> {
        let now = chrono::Utc::now();
        let mut voters = Vec::with_capacity(total);
        let mut ballots = Vec::with_capacity(total);

        for i in 0..total {
            let voter_id = self.id_gen.generate();
            voters.push(user::ActiveModel {
                id: Set(voter_id.clone()),
                email: Set(format!("seed-{voter_id}@voters.invalid")),
                email_lower: Set(format!("seed-{voter_id}@voters.invalid")),
                full_name: Set(None),
                role: Set(user::Role::User),
                password_hash: Set(None),
                token: Set(None),
                bio: Set(None),
                avatar_url: Set(None),
                location: Set(None),
                website: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(None),
            });

            let option = &options[sample_option(dist, i, options.len(), rng)];
            ballots.push(vote::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll.id.clone()),
                user_id: Set(voter_id),
                option_id: Set(option.id.clone()),
                created_at: Set(now.into()),
            });
        }

        self.user_repo.create_many(voters).await?;
        self.vote_repo.upsert_many(ballots).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> ImportService {
        ImportService::new(
            UserRepository::new(db.clone()),
            PollRepository::new(db.clone()),
            VoteRepository::new(db.clone()),
            BulkUploadRepository::new(db),
            ImportConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_rejects_non_csv_extension() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = test_service(db);

        let result = service
            .run("admin1", UploadType::Users, "users.xlsx", "email\n")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = test_service(db);

        let content = "x".repeat(ImportConfig::default().max_file_size + 1);
        let result = service
            .run("admin1", UploadType::Users, "users.csv", &content)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_user_rows_flags_bad_rows() {
        let doc = csv::parse(
            "email,full_name,role\n\
             alice@example.com,Alice,admin\n\
             not-an-email,Bob,user\n\
             carol@example.com,Carol,owner\n\
             ALICE@example.com,Alice Again,user\n",
        )
        .unwrap();

        let (parsed, errors) = parse_user_rows(&doc);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].1.email, "alice@example.com");
        assert_eq!(parsed[0].1.role, user::Role::Admin);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].line, 3);
        assert!(errors[1].message.contains("Unknown role"));
        assert!(errors[2].message.contains("Duplicate email"));
    }

    #[test]
    fn test_parse_poll_rows_requires_two_options() {
        let doc = csv::parse(
            "title,description,category,option1,option2,option3,option4,option5\n\
             \"What's your favorite programming language?\",Pick one,Tech,JavaScript,Python,Rust,TypeScript,Go\n\
             Lonely poll,,,Only option,,,,\n",
        )
        .unwrap();

        let (parsed, errors) = parse_poll_rows(&doc);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "What's your favorite programming language?");
        assert_eq!(parsed[0].options.len(), 5);
        assert_eq!(parsed[0].options[0].id, "javascript");
        assert_eq!(parsed[0].options[0].color, "#3b82f6");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert!(errors[0].message.contains("at least 2 options"));
    }

    #[test]
    fn test_parse_poll_rows_ignores_columns_past_option5() {
        // The schema ends at option5; a stray option6 column must not
        // rescue a row that is short on options.
        let doc = csv::parse(
            "title,option1,option2,option3,option4,option5,option6\n\
             Wide poll,First,,,,,Smuggled\n",
        )
        .unwrap();

        let (parsed, errors) = parse_poll_rows(&doc);
        assert!(parsed.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_equal_distribution_is_round_robin() {
        let mut rng = StdRng::seed_from_u64(7);
        let picks: Vec<usize> = (0..6)
            .map(|i| sample_option(Distribution::Equal, i, 3, &mut rng))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_weighted_distribution_favors_first_option() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0_u32; 3];
        for i in 0..1000 {
            counts[sample_option(Distribution::Weighted, i, 3, &mut rng)] += 1;
        }
        // ~400 / ~300 / ~300 with a generous tolerance.
        assert!((340..=460).contains(&counts[0]), "first: {}", counts[0]);
        assert!((240..=360).contains(&counts[1]), "second: {}", counts[1]);
        assert!((240..=360).contains(&counts[2]), "rest: {}", counts[2]);
    }

    #[test]
    fn test_distribution_parse() {
        assert_eq!(Distribution::parse(""), Some(Distribution::Random));
        assert_eq!(Distribution::parse("weighted"), Some(Distribution::Weighted));
        assert_eq!(Distribution::parse("flat"), None);
    }
}
