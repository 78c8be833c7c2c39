//! Auth gateway: registration and login.
//!
//! Credential hashing sits behind the [`PasswordHasher`] port; login
//! failures collapse into one indistinct message so callers cannot probe
//! which usernames exist.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::DomainError;
use super::ports::{
    NewUserRecord, PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository,
};
use super::user::{User, Username};

/// Map adapter failures to domain errors.
fn map_user_persistence_error(error: UserPersistenceError) -> DomainError {
    match error {
        UserPersistenceError::Connection { message } => {
            tracing::error!(%message, "user store unreachable");
            DomainError::service_unavailable("user store temporarily unavailable")
        }
        UserPersistenceError::Query { message } => {
            tracing::error!(%message, "user store query failed");
            DomainError::internal("user store query failed")
        }
        UserPersistenceError::DuplicateUsername { .. } => {
            DomainError::conflict("Username already taken.")
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> DomainError {
    tracing::error!(%error, "credential hashing failed");
    DomainError::internal("credential hashing failed")
}

fn bad_credentials() -> DomainError {
    DomainError::unauthorized("Invalid username and/or password.")
}

/// Registration input as received from the form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

/// Registration and login over the user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    /// Create a gateway backed by the given store and hasher.
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create an account. Fails with `InvalidRequest` when the password
    /// and confirmation differ, and `Conflict` when the username is taken.
    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        let Registration {
            username,
            email,
            password,
            confirmation,
        } = registration;

        let username = Username::new(username).map_err(|_| {
            DomainError::invalid_request("username must not be empty")
                .with_details(json!({ "field": "username" }))
        })?;
        if password.is_empty() {
            return Err(DomainError::invalid_request("password must not be empty")
                .with_details(json!({ "field": "password" })));
        }
        if password != confirmation {
            return Err(DomainError::invalid_request("Passwords must match."));
        }

        let password_hash = self.hasher.hash(&password).map_err(map_hash_error)?;
        let record = NewUserRecord {
            username,
            email,
            password_hash,
            created_at: Utc::now().naive_utc(),
        };
        self.users
            .insert(record)
            .await
            .map_err(map_user_persistence_error)
    }

    /// Authenticate by username and password.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let username = Username::new(username).map_err(|_| bad_credentials())?;
        let stored = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(bad_credentials)?;

        let matches = self
            .hasher
            .verify(password, &stored.password_hash)
            .map_err(map_hash_error)?;
        if matches {
            Ok(stored.user)
        } else {
            Err(bad_credentials())
        }
    }
}
