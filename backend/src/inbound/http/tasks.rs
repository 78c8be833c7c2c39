//! JSON API handlers for tasks.
//!
//! ```text
//! GET    /api/tasks             list the session user's tasks
//! POST   /api/tasks             create a task
//! DELETE /api/tasks/{id}        delete a task
//! PUT    /api/tasks/{id}        partial update (also PATCH)
//! PUT    /api/tasks/{id}/toggle flip completion (also PATCH, POST)
//! ```
//!
//! All routes require a session. Failures use the
//! `{"success": false, "error": ...}` envelope; an unsupported method on a
//! known resource is a plain `{"error": "Invalid request method"}` 400.

use actix_web::{HttpResponse, web};
use chrono::SecondsFormat;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::domain::{Task, TaskDraft, TaskId, TaskPatch, TaskTime, TaskTimePatch};

use super::error::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;

/// Wire representation of a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub status: bool,
    pub task_time: Option<String>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.get(),
            title: task.title.clone(),
            description: task.description.clone(),
            created_at: task
                .created_at
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            status: task.status,
            task_time: task.task_time.map(|time| time.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TaskListResponse {
    tasks: Vec<TaskDto>,
}

#[derive(Debug, Serialize)]
struct TaskResponse {
    task: TaskDto,
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    task_time: Option<String>,
}

impl From<CreateTaskRequest> for TaskDraft {
    fn from(request: CreateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            // Malformed times are dropped rather than rejected.
            task_time: request
                .task_time
                .as_deref()
                .and_then(TaskTime::parse_lenient),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Body of `PUT/PATCH /api/tasks/{id}`. Absent fields leave the stored
/// values untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    task_time: Option<Option<String>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(request: UpdateTaskRequest) -> Self {
        let task_time = match request.task_time {
            None => TaskTimePatch::Keep,
            Some(None) => TaskTimePatch::Clear,
            Some(Some(raw)) => TaskTimePatch::from_raw(&raw),
        };
        Self {
            title: request.title,
            description: request.description,
            task_time,
        }
    }
}

/// `GET /api/tasks`
pub async fn list_tasks(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user()?;
    let tasks = state.tasks.list(actor.id).await?;
    Ok(HttpResponse::Ok().json(TaskListResponse {
        tasks: tasks.iter().map(TaskDto::from).collect(),
    }))
}

/// `POST /api/tasks`
pub async fn create_task(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<CreateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user()?;
    let task = state
        .tasks
        .create(actor.id, TaskDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(TaskResponse {
        task: TaskDto::from(&task),
    }))
}

/// `DELETE /api/tasks/{id}`
pub async fn delete_task(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user()?;
    let id = TaskId::new(path.into_inner());
    state.tasks.delete(actor.id, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task deleted successfully",
    })))
}

/// `PUT/PATCH /api/tasks/{id}`
pub async fn update_task(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user()?;
    let id = TaskId::new(path.into_inner());
    let task = state
        .tasks
        .update(actor.id, id, TaskPatch::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "task": TaskDto::from(&task),
    })))
}

/// `PUT/PATCH/POST /api/tasks/{id}/toggle`
pub async fn toggle_task(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user()?;
    let id = TaskId::new(path.into_inner());
    let task = state.tasks.toggle(actor.id, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "task": TaskDto::from(&task),
    })))
}

/// Default service for API resources: any unsupported method is a
/// generic 400, matching the page-less client's expectations.
pub async fn invalid_method() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": "Invalid request method" }))
}

/// Route table for the `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/tasks")
            .route(web::get().to(list_tasks))
            .route(web::post().to(create_task))
            .default_service(web::to(invalid_method)),
    )
    .service(
        web::resource("/tasks/{id}/toggle")
            .route(web::put().to(toggle_task))
            .route(web::patch().to(toggle_task))
            .route(web::post().to(toggle_task))
            .default_service(web::to(invalid_method)),
    )
    .service(
        web::resource("/tasks/{id}")
            .route(web::delete().to(delete_task))
            .route(web::put().to(update_task))
            .route(web::patch().to(update_task))
            .default_service(web::to(invalid_method)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{}", TaskTimePatch::Keep)]
    #[case(r#"{"task_time": null}"#, TaskTimePatch::Clear)]
    #[case(r#"{"task_time": ""}"#, TaskTimePatch::Clear)]
    #[case(r#"{"task_time": "25:61"}"#, TaskTimePatch::Keep)]
    fn update_body_maps_time_field_presence(#[case] body: &str, #[case] expected: TaskTimePatch) {
        let request: UpdateTaskRequest = serde_json::from_str(body).expect("valid body");
        let patch = TaskPatch::from(request);
        assert_eq!(patch.task_time, expected);
    }

    #[test]
    fn update_body_sets_valid_time() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"task_time": "07:15"}"#).expect("valid body");
        let patch = TaskPatch::from(request);
        let expected = TaskTime::parse_lenient("07:15").expect("valid time");
        assert_eq!(patch.task_time, TaskTimePatch::Set(expected));
    }

    #[test]
    fn create_body_drops_malformed_time() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "t", "task_time": "25:61"}"#).expect("valid body");
        let draft = TaskDraft::from(request);
        assert!(draft.task_time.is_none());
    }
}
