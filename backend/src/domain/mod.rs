//! Transport-agnostic core: entities, validation, services, and ports.

mod auth;
mod error;
pub mod ports;
mod task;
mod tasks;
mod user;

pub use auth::{AuthService, Registration};
pub use error::{DomainError, ErrorCode};
pub use task::{Task, TaskDraft, TaskId, TaskPatch, TaskTime, TaskTimeParseError, TaskTimePatch};
pub use tasks::TaskService;
pub use user::{User, UserId, Username, UsernameValidationError};
