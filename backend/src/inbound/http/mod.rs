//! Driving HTTP adapters: JSON API handlers, server-rendered pages, and
//! the session plumbing they share.

pub mod error;
pub mod pages;
pub mod session;
pub mod state;
pub mod tasks;

pub use error::{ApiError, ApiResult};
pub use session::SessionContext;
