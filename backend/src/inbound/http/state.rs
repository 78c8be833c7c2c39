//! Shared handler state.

use crate::domain::{AuthService, TaskService};

/// Services injected into every HTTP handler via `web::Data`.
#[derive(Clone)]
pub struct HttpState {
    pub tasks: TaskService,
    pub auth: AuthService,
}

impl HttpState {
    /// Bundle the domain services for handler injection.
    pub fn new(tasks: TaskService, auth: AuthService) -> Self {
        Self { tasks, auth }
    }
}
