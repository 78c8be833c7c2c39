//! Task entity and the value types describing its mutations.
//!
//! A task is a titled, optionally timed, completable unit of work owned by
//! exactly one user. `task_time` is a bare clock time with no date or zone;
//! its only wire format is a zero-padded 24-hour `HH:MM` string.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user::UserId;

/// Opaque identifier assigned to a task by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(i64);

impl TaskId {
    /// Wrap a raw store identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier for persistence adapters and routes.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse failures for [`TaskTime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskTimeParseError {
    /// Input does not spell a valid `HH:MM` clock time.
    #[error("task time must be a valid HH:MM value")]
    Invalid,
}

/// Clock time attached to a task, without a date component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskTime(NaiveTime);

impl TaskTime {
    /// Parse a `HH:MM` string, rejecting anything outside `00:00`–`23:59`.
    pub fn parse(raw: &str) -> Result<Self, TaskTimeParseError> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| TaskTimeParseError::Invalid)
    }

    /// Lenient wire-side parse: blank and malformed input both collapse to
    /// `None`. Malformed times are dropped, not rejected (documented policy).
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    /// Underlying clock time.
    pub fn time(self) -> NaiveTime {
        self.0
    }
}

impl std::fmt::Display for TaskTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl std::str::FromStr for TaskTime {
    type Err = TaskTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A stored task, always owned by exactly one existing user.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Store-assigned, immutable identifier.
    pub id: TaskId,
    /// Owning user; every read and write is scoped to this account.
    pub owner: UserId,
    /// Short required text.
    pub title: String,
    /// Free text, empty when not provided.
    pub description: String,
    /// Completion flag, `false` on creation.
    pub status: bool,
    /// Optional clock time.
    pub task_time: Option<TaskTime>,
    /// Set once at creation (UTC).
    pub created_at: NaiveDateTime,
    /// Refreshed on every mutation (UTC).
    pub updated_at: NaiveDateTime,
}

/// Fields supplied when creating a task. Validation and defaulting happen
/// in the task service.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub task_time: Option<TaskTime>,
}

/// Requested change to `task_time` within a [`TaskPatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskTimePatch {
    /// Field absent or malformed: keep the stored value.
    #[default]
    Keep,
    /// Explicitly empty: clear to absent.
    Clear,
    /// Replace with a parsed value.
    Set(TaskTime),
}

impl TaskTimePatch {
    /// Interpret raw wire text under the lenient-parse policy: blank clears,
    /// malformed keeps the prior value, valid `HH:MM` replaces it.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Clear;
        }
        TaskTime::parse_lenient(raw).map_or(Self::Keep, Self::Set)
    }
}

/// Partial update to a task. Omitted fields retain their stored values.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_time: TaskTimePatch,
}

impl TaskPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.task_time == TaskTimePatch::Keep
    }
}

impl Task {
    /// Resolve the fields a patch would leave on this task, without
    /// mutating the stored row.
    pub fn patched_fields(&self, patch: &TaskPatch) -> (String, String, Option<TaskTime>) {
        let title = patch.title.clone().unwrap_or_else(|| self.title.clone());
        let description = patch
            .description
            .clone()
            .unwrap_or_else(|| self.description.clone());
        let task_time = match patch.task_time {
            TaskTimePatch::Keep => self.task_time,
            TaskTimePatch::Clear => None,
            TaskTimePatch::Set(time) => Some(time),
        };
        (title, description, task_time)
    }
}
