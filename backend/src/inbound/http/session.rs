//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or retrieving the acting
//! user.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{DomainError, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const USERNAME_KEY: &str = "username";

/// The authenticated identity stored in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user in the session cookie.
    pub fn persist_user(&self, user: &User) -> Result<(), DomainError> {
        self.0
            .insert(USER_ID_KEY, user.id().get())
            .and_then(|()| self.0.insert(USERNAME_KEY, user.username().as_str()))
            .map_err(|error| DomainError::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current user from the session, if present.
    pub fn user(&self) -> Result<Option<SessionUser>, DomainError> {
        let id = self
            .0
            .get::<i64>(USER_ID_KEY)
            .map_err(|error| DomainError::internal(format!("failed to read session: {error}")))?;
        let Some(id) = id else {
            return Ok(None);
        };
        let username = self
            .0
            .get::<String>(USERNAME_KEY)
            .map_err(|error| DomainError::internal(format!("failed to read session: {error}")))?
            .unwrap_or_default();
        Ok(Some(SessionUser {
            id: UserId::new(id),
            username,
        }))
    }

    /// Require an authenticated user or fail with `Unauthorized`.
    pub fn require_user(&self) -> Result<SessionUser, DomainError> {
        self.user()?
            .ok_or_else(|| DomainError::unauthorized("login required"))
    }

    /// Destroy the session. Idempotent when no session exists.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use actix_session::SessionMiddleware;
    use actix_session::storage::CookieSessionStore;
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    use super::*;
    use crate::domain::Username;
    use crate::inbound::http::error::ApiError;

    fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".into())
            .cookie_secure(false)
            .build()
    }

    fn sample_user() -> User {
        User::new(
            UserId::new(42),
            Username::new("alice").expect("valid username"),
            "a@x.com",
        )
    }

    #[actix_web::test]
    async fn round_trips_the_session_user() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        session.persist_user(&sample_user()).map_err(ApiError::from)?;
                        Ok::<_, ApiError>(HttpResponse::Ok().finish())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let user = session.require_user().map_err(ApiError::from)?;
                        Ok::<_, ApiError>(
                            HttpResponse::Ok().body(format!("{}:{}", user.id, user.username)),
                        )
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        let body = test::read_body(get_res).await;
        assert_eq!(body, "42:alice");
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorised() {
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                let _ = session.require_user().map_err(ApiError::from)?;
                Ok::<_, ApiError>(HttpResponse::Ok().finish())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
