//! User service: accounts, sessions, and profiles.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use pollhub_common::{AppError, AppResult, IdGenerator};
use pollhub_db::{
    entities::user::{self, Role},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    /// Email address, unique per account (case-insensitive).
    #[validate(email)]
    pub email: String,
    /// Password, hashed with argon2id before storage.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Display name.
    pub full_name: Option<String>,
}

/// Profile fields a user may edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// User service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an account and issue a bearer token. The very first account
    /// on an empty instance becomes the admin.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                input.email
            )));
        }

        let role = if self.user_repo.count().await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            full_name: Set(input.full_name.filter(|n| !n.trim().is_empty())),
            role: Set(role),
            password_hash: Set(Some(hash_password(&input.password)?)),
            token: Set(Some(self.id_gen.generate_token())),
            bio: Set(None),
            avatar_url: Set(None),
            location: Set(None),
            website: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Authenticate by email and password.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // Imported accounts without a completed signup carry no hash.
        let password_hash = user.password_hash.clone().ok_or(AppError::Unauthorized)?;
        if !verify_password(password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        // An account created by import has no token until first signin.
        if user.token.is_none() {
            return self.regenerate_token_model(user).await;
        }
        Ok(user)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Issue a fresh token, invalidating every existing session.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.regenerate_token_model(user).await
    }

    async fn regenerate_token_model(&self, user: user::Model) -> AppResult<user::Model> {
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Get a user by id.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Update profile fields.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(full_name) = input.full_name {
            active.full_name = Set(Some(full_name).filter(|n| !n.trim().is_empty()));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio).filter(|b| !b.trim().is_empty()));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url).filter(|u| !u.trim().is_empty()));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location).filter(|l| !l.trim().is_empty()));
        }
        if let Some(website) = input.website {
            active.website = Set(Some(website).filter(|w| !w.trim().is_empty()));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// List users, paginated. Admin dashboard only.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all(limit, offset).await
    }
}

/// Hash a password with argon2id.
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
