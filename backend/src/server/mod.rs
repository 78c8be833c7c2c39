//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::domain::{AuthService, TaskService};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{pages, tasks};
use crate::middleware::Trace;
use crate::outbound::persistence::{DbPool, DieselTaskRepository, DieselUserRepository};
use crate::outbound::security::Argon2PasswordHasher;

/// Dependencies each worker clones into its `App` instance.
#[derive(Clone)]
pub struct AppDependencies {
    pub http_state: web::Data<HttpState>,
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Build the shared HTTP state from database-backed adapters.
#[must_use]
pub fn build_http_state(pool: &DbPool) -> web::Data<HttpState> {
    let tasks = TaskService::new(Arc::new(DieselTaskRepository::new(pool.clone())));
    let auth = AuthService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher),
    );
    web::Data::new(HttpState::new(tasks, auth))
}

/// Assemble the application: session middleware, tracing, page routes, and
/// the `/api` scope.
///
/// The session middleware wraps the whole app because the page surface and
/// the JSON API share the same cookie.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    App::new()
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .service(web::scope("/api").configure(tasks::configure))
        .service(pages::index)
        .service(pages::login_form)
        .service(pages::login_submit)
        .service(pages::register_form)
        .service(pages::register_submit)
        .service(pages::logout)
        .service(pages::task_list)
        .service(pages::task_create)
        .service(pages::task_edit_form)
        .service(pages::task_edit_submit)
        .service(pages::task_delete)
}

/// Construct an Actix HTTP server from a prepared [`ServerConfig`].
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let http_state = build_http_state(&config.pool);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        pool: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
