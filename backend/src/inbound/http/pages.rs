//! Server-rendered page handlers.
//!
//! The page surface mirrors the JSON API over the same services but with
//! form posts and redirects: unauthenticated visitors are sent to
//! `/login`, recoverable failures re-render the form with a message, and
//! edit/delete of a missing or foreign task quietly bounces back to the
//! task list (deliberately laxer than the API, which returns 404).

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use askama::Template;

use crate::domain::{
    DomainError, ErrorCode, Registration, Task, TaskDraft, TaskId, TaskPatch, TaskTime,
    TaskTimePatch,
};

use super::error::{ApiError, ApiResult};
use super::session::{SessionContext, SessionUser};
use super::state::HttpState;

/// Task fields prepared for templates.
struct TaskView {
    id: i64,
    title: String,
    description: String,
    status: bool,
    /// `HH:MM`, or empty when the task has no time.
    task_time: String,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.get(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            task_time: task
                .task_time
                .map(|time| time.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    username: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage {
    message: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterPage {
    message: Option<String>,
}

#[derive(Template)]
#[template(path = "task_list.html")]
struct TaskListPage {
    username: String,
    tasks: Vec<TaskView>,
    message: Option<String>,
}

#[derive(Template)]
#[template(path = "edit_task.html")]
struct EditTaskPage {
    task: TaskView,
    message: Option<String>,
}

fn render<T: Template>(template: &T) -> ApiResult<HttpResponse> {
    let body = template
        .render()
        .map_err(|error| ApiError::from(DomainError::internal(format!("template render failed: {error}"))))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Session lookup for pages: unauthenticated means redirect, not 401.
fn page_user(session: &SessionContext) -> ApiResult<Result<SessionUser, HttpResponse>> {
    match session.user()? {
        Some(user) => Ok(Ok(user)),
        None => Ok(Err(see_other("/login"))),
    }
}

#[get("/")]
pub async fn index(session: SessionContext) -> ApiResult<HttpResponse> {
    let username = session.user()?.map(|user| user.username);
    render(&IndexPage { username })
}

#[get("/login")]
pub async fn login_form() -> ApiResult<HttpResponse> {
    render(&LoginPage { message: None })
}

/// Credentials posted by the login form.
#[derive(Debug, serde::Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[post("/login")]
pub async fn login_submit(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<LoginForm>,
) -> ApiResult<HttpResponse> {
    match state.auth.login(&form.username, &form.password).await {
        Ok(user) => {
            session.persist_user(&user)?;
            Ok(see_other("/"))
        }
        Err(error) if error.code() == ErrorCode::Unauthorized => render(&LoginPage {
            message: Some(error.message().to_owned()),
        }),
        Err(error) => Err(error.into()),
    }
}

#[get("/register")]
pub async fn register_form() -> ApiResult<HttpResponse> {
    render(&RegisterPage { message: None })
}

/// Fields posted by the registration form.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterForm {
    username: String,
    email: String,
    password: String,
    confirmation: String,
}

#[post("/register")]
pub async fn register_submit(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<RegisterForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
        confirmation: form.confirmation,
    };
    match state.auth.register(registration).await {
        Ok(user) => {
            session.persist_user(&user)?;
            Ok(see_other("/"))
        }
        Err(error)
            if matches!(error.code(), ErrorCode::InvalidRequest | ErrorCode::Conflict) =>
        {
            render(&RegisterPage {
                message: Some(error.message().to_owned()),
            })
        }
        Err(error) => Err(error.into()),
    }
}

#[get("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    see_other("/")
}

async fn render_task_list(
    state: &HttpState,
    user: &SessionUser,
    message: Option<String>,
) -> ApiResult<HttpResponse> {
    let tasks = state.tasks.list(user.id).await?;
    render(&TaskListPage {
        username: user.username.clone(),
        tasks: tasks.iter().map(TaskView::from).collect(),
        message,
    })
}

#[get("/task")]
pub async fn task_list(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let user = match page_user(&session)? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    render_task_list(&state, &user, None).await
}

/// Fields shared by the create and edit forms.
#[derive(Debug, serde::Deserialize)]
pub struct TaskForm {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    task_time: String,
}

#[post("/task")]
pub async fn task_create(
    session: SessionContext,
    state: web::Data<HttpState>,
    form: web::Form<TaskForm>,
) -> ApiResult<HttpResponse> {
    let user = match page_user(&session)? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let form = form.into_inner();
    let draft = TaskDraft {
        title: form.title,
        description: Some(form.description),
        task_time: TaskTime::parse_lenient(&form.task_time),
    };
    match state.tasks.create(user.id, draft).await {
        Ok(_) => Ok(see_other("/task")),
        Err(error) if error.code() == ErrorCode::InvalidRequest => {
            render_task_list(&state, &user, Some(error.message().to_owned())).await
        }
        Err(error) => Err(error.into()),
    }
}

#[get("/task/edit/{id}")]
pub async fn task_edit_form(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = match page_user(&session)? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    match state.tasks.find(user.id, TaskId::new(path.into_inner())).await {
        Ok(task) => render(&EditTaskPage {
            task: TaskView::from(&task),
            message: None,
        }),
        // Missing or foreign task: back to the list, no error page.
        Err(error) if error.code() == ErrorCode::NotFound => Ok(see_other("/task")),
        Err(error) => Err(error.into()),
    }
}

#[post("/task/edit/{id}")]
pub async fn task_edit_submit(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    form: web::Form<TaskForm>,
) -> ApiResult<HttpResponse> {
    let user = match page_user(&session)? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let id = TaskId::new(path.into_inner());
    let form = form.into_inner();
    let patch = TaskPatch {
        title: Some(form.title),
        description: Some(form.description),
        task_time: TaskTimePatch::from_raw(&form.task_time),
    };
    match state.tasks.update(user.id, id, patch).await {
        Ok(_) => Ok(see_other("/task")),
        Err(error) if error.code() == ErrorCode::NotFound => Ok(see_other("/task")),
        Err(error) if error.code() == ErrorCode::InvalidRequest => {
            match state.tasks.find(user.id, id).await {
                Ok(task) => render(&EditTaskPage {
                    task: TaskView::from(&task),
                    message: Some(error.message().to_owned()),
                }),
                Err(_) => Ok(see_other("/task")),
            }
        }
        Err(error) => Err(error.into()),
    }
}

#[post("/task/delete/{id}")]
pub async fn task_delete(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = match page_user(&session)? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    match state.tasks.delete(user.id, TaskId::new(path.into_inner())).await {
        // A missing or foreign task deletes as a no-op on this surface.
        Ok(()) => Ok(see_other("/task")),
        Err(error) if error.code() == ErrorCode::NotFound => Ok(see_other("/task")),
        Err(error) => Err(error.into()),
    }
}
