//! Row types bridging the Diesel schema and domain entities.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::ports::{NewTaskRecord, NewUserRecord, TaskChanges};
use crate::domain::{Task, TaskId, TaskTime, User, UserId, Username};

use super::schema::{tasks, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl UserRow {
    /// Convert to the domain identity, dropping the credential hash.
    ///
    /// The stored username was validated on insert; a row that fails
    /// validation indicates outside tampering and surfaces as an error in
    /// the repository.
    pub fn into_domain(self) -> Result<User, crate::domain::UsernameValidationError> {
        let username = Username::new(self.username)?;
        Ok(User::new(UserId::new(self.id), username, self.email))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl From<NewUserRecord> for NewUserRow {
    fn from(record: NewUserRecord) -> Self {
        Self {
            username: record.username.as_str().to_owned(),
            email: record.email,
            password_hash: record.password_hash,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: bool,
    pub task_time: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let task_time = row.task_time.as_deref().and_then(|raw| {
            let parsed = TaskTime::parse_lenient(raw);
            if parsed.is_none() {
                tracing::warn!(task_id = row.id, value = raw, "unparseable stored task_time");
            }
            parsed
        });
        Self {
            id: TaskId::new(row.id),
            owner: UserId::new(row.user_id),
            title: row.title,
            description: row.description,
            status: row.status,
            task_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: bool,
    pub task_time: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<NewTaskRecord> for NewTaskRow {
    fn from(record: NewTaskRecord) -> Self {
        Self {
            user_id: record.owner.get(),
            title: record.title,
            description: record.description,
            status: record.status,
            task_time: record.task_time.map(|time| time.to_string()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Full replacement for a task's mutable columns. `treat_none_as_null`
/// makes a cleared `task_time` write NULL instead of skipping the column.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRowChanges {
    pub title: String,
    pub description: String,
    pub status: bool,
    pub task_time: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<TaskChanges> for TaskRowChanges {
    fn from(changes: TaskChanges) -> Self {
        Self {
            title: changes.title,
            description: changes.description,
            status: changes.status,
            task_time: changes.task_time.map(|time| time.to_string()),
            updated_at: changes.updated_at,
        }
    }
}
