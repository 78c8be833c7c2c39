//! SQLite connection pool construction and embedded migrations.

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;

/// Shared r2d2 pool handed to the repository adapters.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Failures raised while building or using the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Pool construction failed.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
    /// A pooled connection could not be checked out.
    #[error("failed to check out a pooled connection: {message}")]
    Checkout { message: String },
    /// Embedded migrations could not be applied.
    #[error("failed to run migrations: {message}")]
    Migration { message: String },
}

/// Per-connection pragmas. Foreign keys are off by default in SQLite and
/// must be enabled on every connection for owner-cascade deletes to work.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn build_pool_sized(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|error| PoolError::Build {
            message: error.to_string(),
        })?;

    let mut conn = pool.get().map_err(|error| PoolError::Checkout {
        message: error.to_string(),
    })?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|error| PoolError::Migration {
            message: error.to_string(),
        })?;
    drop(conn);

    Ok(pool)
}

/// Build a migrated pool against the given SQLite database path.
pub fn build_pool(database_url: &str) -> Result<DbPool, PoolError> {
    build_pool_sized(database_url, 8)
}

/// Build a migrated single-connection in-memory pool.
///
/// Every in-memory SQLite connection is its own database, so the pool is
/// capped at one connection. Used by tests and `DATABASE_URL=":memory:"`.
pub fn build_in_memory_pool() -> Result<DbPool, PoolError> {
    build_pool_sized(":memory:", 1)
}
