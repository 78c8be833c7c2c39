//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the task store and the credential hasher). Each trait exposes strongly
//! typed errors so adapters map their failures into predictable variants.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use super::task::{Task, TaskId, TaskTime};
use super::user::{User, UserId, Username};

/// Errors surfaced by the task persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskPersistenceError {
    /// Database connectivity or pool checkout failures.
    #[error("task store connection failed: {message}")]
    Connection { message: String },
    /// Query execution failures.
    #[error("task store query failed: {message}")]
    Query { message: String },
}

impl TaskPersistenceError {
    /// Helper for connection-level adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the user persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Database connectivity or pool checkout failures.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// Query execution failures.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// The username is already taken.
    #[error("username {username} already exists")]
    DuplicateUsername { username: String },
}

impl UserPersistenceError {
    /// Helper for connection-level adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for unique-username violations.
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }
}

/// Fully resolved task row ready for insertion; the service has already
/// validated and defaulted every field.
#[derive(Debug, Clone)]
pub struct NewTaskRecord {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub status: bool,
    pub task_time: Option<TaskTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Full replacement values for a task's mutable columns. The service
/// resolves patches against the stored row before handing changes over,
/// so adapters never see partial updates.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub status: bool,
    pub task_time: Option<TaskTime>,
    pub updated_at: NaiveDateTime,
}

/// Persistent, per-user scoped task storage.
///
/// Every accessor takes the owning [`UserId`]; adapters must never return
/// or mutate another user's rows. A missing row and a foreign row are
/// indistinguishable (`None` / `false`).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task and return it with its assigned id.
    async fn insert(&self, record: NewTaskRecord) -> Result<Task, TaskPersistenceError>;

    /// All tasks owned by `owner`, newest creation first (ties broken by
    /// descending id).
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Task>, TaskPersistenceError>;

    /// Load one task if it exists and belongs to `owner`.
    async fn find_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Task>, TaskPersistenceError>;

    /// Apply changes to an owned task, returning the updated row, or
    /// `None` when the task is missing or foreign.
    async fn update_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, TaskPersistenceError>;

    /// Delete an owned task. Returns `false` when the task is missing or
    /// foreign.
    async fn delete_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<bool, TaskPersistenceError>;
}

/// New account ready for insertion; the password has already been hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: Username,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// A user together with their stored credential hash. Only the auth
/// gateway sees this type; it never crosses into adapters.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Persistent account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with
    /// [`UserPersistenceError::DuplicateUsername`] when the name is taken.
    async fn insert(&self, record: NewUserRecord) -> Result<User, UserPersistenceError>;

    /// Look up an account and its credential hash by username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;
}

/// Failures raised by the credential hasher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// Hashing or verification could not run.
    #[error("password hashing failed: {message}")]
    Hash { message: String },
}

impl PasswordHashError {
    /// Helper for hashing failures.
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }
}

/// One-way credential hashing. Kept behind a port so domain tests can use
/// a cheap stub instead of a real key-derivation function.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a candidate password against a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError>;
}
