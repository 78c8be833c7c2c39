//! SQLite-backed `UserRepository` implementation using Diesel.
//!
//! The UNIQUE constraint on `users.username` is the source of truth for
//! duplicate registrations; the violation maps to a typed port error.

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use crate::domain::ports::{
    NewUserRecord, StoredCredentials, UserPersistenceError, UserRepository,
};
use crate::domain::{User, Username};

use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map Diesel errors to port errors, with the unique-username special case.
fn map_diesel_error(username: &str, error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserPersistenceError::duplicate_username(username)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection closed")
        }
        other => {
            debug!(%other, "diesel user operation failed");
            UserPersistenceError::query("database error")
        }
    }
}

fn row_to_credentials(row: UserRow) -> Result<StoredCredentials, UserPersistenceError> {
    let password_hash = row.password_hash.clone();
    let user = row
        .into_domain()
        .map_err(|error| UserPersistenceError::query(format!("corrupt user row: {error}")))?;
    Ok(StoredCredentials {
        user,
        password_hash,
    })
}

async fn run_blocking<T, F>(pool: &DbPool, operation: F) -> Result<T, UserPersistenceError>
where
    T: Send + 'static,
    F: FnOnce(DbPool) -> Result<T, UserPersistenceError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || operation(pool))
        .await
        .map_err(|error| UserPersistenceError::connection(format!("blocking task failed: {error}")))?
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, record: NewUserRecord) -> Result<User, UserPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = pool
                .get()
                .map_err(|error| UserPersistenceError::connection(error.to_string()))?;
            let username = record.username.as_str().to_owned();
            let row: UserRow = diesel::insert_into(users::table)
                .values(NewUserRow::from(record))
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .map_err(|error| map_diesel_error(&username, error))?;
            row.into_domain()
                .map_err(|error| UserPersistenceError::query(format!("corrupt user row: {error}")))
        })
        .await
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let username = username.clone();
        run_blocking(&self.pool, move |pool| {
            let mut conn = pool
                .get()
                .map_err(|error| UserPersistenceError::connection(error.to_string()))?;
            let row: Option<UserRow> = users::table
                .filter(users::username.eq(username.as_str()))
                .select(UserRow::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|error| map_diesel_error(username.as_str(), error))?;
            row.map(row_to_credentials).transpose()
        })
        .await
    }
}
