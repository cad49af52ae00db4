//! Account registration and login for the bundled identity provider.

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::domain::entities::{Account, CreateOutcome};
use crate::domain::identity::IdentityProvider;
use crate::domain::repositories::AccountRepository;
use crate::error::AppError;
use crate::utils::password::{hash_password, verify_password};

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Registers accounts and exchanges credentials for bearer tokens.
///
/// Password hashing runs on the blocking pool.
pub struct AccountService<A: AccountRepository> {
    repository: Arc<A>,
    identity: Arc<dyn IdentityProvider>,
}

impl<A: AccountRepository> AccountService<A> {
    pub fn new(repository: Arc<A>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            repository,
            identity,
        }
    }

    /// Creates an account. Never overwrites an existing one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - Username is not 3-32 characters of `[A-Za-z0-9_.-]`
    /// - Password is shorter than 8 or longer than 128 characters
    ///
    /// Returns [`AppError::Conflict`] if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<Account, AppError> {
        validate_username(username)?;
        validate_password(password)?;

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| internal("Password hashing task failed", e))?
            .map_err(|e| internal("Failed to hash password", e))?;

        let account = Account {
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        match self.repository.create(&account).await? {
            CreateOutcome::Created => {
                info!(username, "Account registered");
                Ok(account)
            }
            CreateOutcome::AlreadyExists => Err(AppError::conflict(
                "Username already taken",
                json!({ "username": username }),
            )),
        }
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for unknown users and wrong passwords
    /// alike.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let invalid = || AppError::unauthorized("Invalid credentials", json!({}));

        let account = self.repository.find(username).await?.ok_or_else(invalid)?;

        let password = password.to_string();
        let stored_hash = account.password_hash;
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| internal("Password check task failed", e))?
                .map_err(|e| internal("Stored credentials are unreadable", e))?;

        if !matches {
            return Err(invalid());
        }

        self.identity.issue(&account.username)
    }
}

fn internal(message: &str, e: impl std::fmt::Display) -> AppError {
    AppError::internal(message, json!({ "reason": e.to_string() }))
}

fn validate_username(username: &str) -> Result<(), AppError> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::bad_request(
            "Username must be 3-32 characters of letters, digits, '_', '.', '-'",
            json!({ "username": username }),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return Err(AppError::bad_request(
            "Password must be 8-128 characters",
            json!({ "provided_length": len }),
        ));
    }
    Ok(())
}
