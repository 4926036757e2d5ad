use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::password::{burn_verification, hash_password, verify_password, PasswordError};
use crate::auth::validation::{validate_email_format, validate_password_strength, validate_username_format};
use crate::auth::{decode_jwt, generate_jwt, issue_token_pair, Claims, TokenError, TokenPair, TokenType};
use crate::config;
use crate::database::models::User;
use crate::database::{DatabaseError, Repository};
use crate::error::FieldErrors;
use crate::middleware::AuthUser;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("Old password is incorrect")]
    InvalidOldPassword,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        AccountError::Database(err.into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Response body of a token refresh
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// Registration, credential checks, token issuance and password changes
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn users(&self) -> Repository<User> {
        Repository::new("users", self.pool.clone())
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<User, AccountError> {
        let username = input.username.trim();
        let email = input.email.trim();
        let mut errors = FieldErrors::new();

        match validate_username_format(username) {
            Ok(()) => {
                if self.find_by_username(username).await?.is_some() {
                    errors.insert("username".to_string(), USERNAME_TAKEN.to_string());
                }
            }
            Err(msg) => {
                errors.insert("username".to_string(), msg);
            }
        }

        if !email.is_empty() {
            if let Err(msg) = validate_email_format(email) {
                errors.insert("email".to_string(), msg);
            }
        }

        if input.password.is_empty() {
            errors.insert("password".to_string(), "This field may not be blank.".to_string());
        } else if let Err(problems) = validate_password_strength(
            &input.password,
            username,
            config::config().security.min_password_length,
        ) {
            errors.insert("password".to_string(), problems.join(" "));
        }

        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let password_hash = hash_password(&input.password)?;

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match inserted {
            Ok(user) => {
                info!(user_id = user.id, "Registered user {}", user.username);
                Ok(user)
            }
            // Lost a race with a concurrent registration of the same name
            Err(e) if e.is_unique_violation() => {
                let mut errors = FieldErrors::new();
                errors.insert("username".to_string(), USERNAME_TAKEN.to_string());
                Err(AccountError::Validation(errors))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown usernames and wrong passwords fail identically
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AccountError> {
        match self.find_by_username(username).await? {
            Some(user) if verify_password(password, &user.password_hash) => {
                info!(user_id = user.id, "Login succeeded for {}", user.username);
                Ok(issue_token_pair(user.id, &user.username)?)
            }
            Some(user) => {
                warn!(user_id = user.id, "Login failed: wrong password");
                Err(AccountError::InvalidCredentials)
            }
            None => {
                burn_verification(password);
                warn!("Login failed: unknown username");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AccountError> {
        let claims = decode_jwt(refresh_token, TokenType::Refresh)?;

        let user = self
            .users()
            .select_one(claims.user_id)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(claims.username.clone()))?;

        let access = generate_jwt(&Claims::new(user.id, &user.username, TokenType::Access))?;
        Ok(AccessToken { access })
    }

    pub async fn profile(&self, caller: &AuthUser) -> Result<User, AccountError> {
        self.users()
            .select_one(caller.user_id)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(caller.username.clone()))
    }

    /// Tokens issued before the change stay valid until they expire
    pub async fn change_password(
        &self,
        caller: &AuthUser,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let user = self.profile(caller).await?;

        if !verify_password(old_password, &user.password_hash) {
            warn!(user_id = user.id, "Password change rejected: old password mismatch");
            return Err(AccountError::InvalidOldPassword);
        }

        self.store_new_password(&user, new_password, "new_password").await?;
        info!(user_id = user.id, "Password changed for {}", user.username);
        Ok(())
    }

    /// Administrative reset without the old password
    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<(), AccountError> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(username.to_string()))?;

        self.store_new_password(&user, new_password, "password").await?;
        info!(user_id = user.id, "Password reset for {}", user.username);
        Ok(())
    }

    async fn store_new_password(&self, user: &User, new_password: &str, field: &str) -> Result<(), AccountError> {
        if let Err(problems) = validate_password_strength(
            new_password,
            &user.username,
            config::config().security.min_password_length,
        ) {
            let mut errors = FieldErrors::new();
            errors.insert(field.to_string(), problems.join(" "));
            return Err(AccountError::Validation(errors));
        }

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A name Postgres cannot store cannot belong to anyone
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
        if username.contains('\0') {
            return Ok(None);
        }
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
