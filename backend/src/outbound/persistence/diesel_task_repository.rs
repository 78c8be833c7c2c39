//! SQLite-backed `TaskRepository` implementation using Diesel.
//!
//! Every query filters on the owning user id, so a foreign task id behaves
//! exactly like a missing one. Diesel's synchronous API runs on the
//! blocking thread pool to keep handlers async.

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use crate::domain::ports::{NewTaskRecord, TaskChanges, TaskPersistenceError, TaskRepository};
use crate::domain::{Task, TaskId, UserId};

use super::models::{NewTaskRow, TaskRow, TaskRowChanges};
use super::pool::DbPool;
use super::schema::tasks;

/// Diesel-backed implementation of the `TaskRepository` port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map Diesel errors to port errors.
fn map_diesel_error(error: diesel::result::Error) -> TaskPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    debug!(%error, "diesel task operation failed");
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TaskPersistenceError::connection("database connection closed")
        }
        _ => TaskPersistenceError::query("database error"),
    }
}

fn checkout(pool: &DbPool) -> Result<
    diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>,
    TaskPersistenceError,
> {
    pool.get()
        .map_err(|error| TaskPersistenceError::connection(error.to_string()))
}

async fn run_blocking<T, F>(pool: &DbPool, operation: F) -> Result<T, TaskPersistenceError>
where
    T: Send + 'static,
    F: FnOnce(DbPool) -> Result<T, TaskPersistenceError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || operation(pool))
        .await
        .map_err(|error| TaskPersistenceError::connection(format!("blocking task failed: {error}")))?
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn insert(&self, record: NewTaskRecord) -> Result<Task, TaskPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = checkout(&pool)?;
            let row: TaskRow = diesel::insert_into(tasks::table)
                .values(NewTaskRow::from(record))
                .returning(TaskRow::as_returning())
                .get_result(&mut conn)
                .map_err(map_diesel_error)?;
            Ok(Task::from(row))
        })
        .await
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Task>, TaskPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = checkout(&pool)?;
            let rows: Vec<TaskRow> = tasks::table
                .filter(tasks::user_id.eq(owner.get()))
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .select(TaskRow::as_select())
                .load(&mut conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Task::from).collect())
        })
        .await
    }

    async fn find_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Task>, TaskPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = checkout(&pool)?;
            let row: Option<TaskRow> = tasks::table
                .filter(tasks::id.eq(id.get()).and(tasks::user_id.eq(owner.get())))
                .select(TaskRow::as_select())
                .first(&mut conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(Task::from))
        })
        .await
    }

    async fn update_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, TaskPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = checkout(&pool)?;
            let row: Option<TaskRow> = diesel::update(
                tasks::table.filter(tasks::id.eq(id.get()).and(tasks::user_id.eq(owner.get()))),
            )
            .set(TaskRowChanges::from(changes))
            .returning(TaskRow::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(map_diesel_error)?;
            Ok(row.map(Task::from))
        })
        .await
    }

    async fn delete_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<bool, TaskPersistenceError> {
        run_blocking(&self.pool, move |pool| {
            let mut conn = checkout(&pool)?;
            let deleted = diesel::delete(
                tasks::table.filter(tasks::id.eq(id.get()).and(tasks::user_id.eq(owner.get()))),
            )
            .execute(&mut conn)
            .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }
}
