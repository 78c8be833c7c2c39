//! HTTP error payloads and mapping from domain errors.
//!
//! Keep the domain free of transport concerns by translating
//! [`DomainError`] into Actix responses here. The API envelope is
//! `{"success": false, "error": "..."}` with the matching 4xx/5xx status;
//! the request's trace identifier rides along in a response header.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::error;

use crate::domain::{DomainError, ErrorCode};
use crate::middleware::TraceId;
use crate::middleware::trace::TRACE_ID_HEADER;

/// Standard error envelope returned by the JSON API.
#[derive(Debug, Clone)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
}

impl ApiError {
    /// Construct an API error from a domain failure, capturing any ambient
    /// trace identifier.
    pub fn from_domain(error: DomainError) -> Self {
        Self {
            code: error.code(),
            message: error.message().to_owned(),
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    fn to_status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut envelope = serializer.serialize_struct("ApiError", 2)?;
        envelope.serialize_field("success", &false)?;
        envelope.serialize_field("error", self.message())?;
        envelope.end()
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        ApiError::from_domain(value)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.to_status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = &self.trace_id {
            builder.insert_header((TRACE_ID_HEADER, id.clone()));
        }
        if matches!(self.code, ErrorCode::InternalError) {
            error!(message = %self.message, "internal error returned to client");
            let mut redacted = self.clone();
            redacted.message = "Internal server error".to_owned();
            return builder.json(redacted);
        }
        builder.json(self)
    }
}

/// Convenience alias for JSON API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn serializes_as_the_failure_envelope() {
        let err = ApiError::from(DomainError::not_found("Task not found"));
        let value = serde_json::to_value(&err).expect("serializable");
        assert_eq!(value, json!({ "success": false, "error": "Task not found" }));
    }

    #[test]
    fn maps_codes_to_statuses() {
        let cases = [
            (DomainError::invalid_request("bad"), StatusCode::BAD_REQUEST),
            (DomainError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (DomainError::conflict("taken"), StatusCode::CONFLICT),
            (DomainError::not_found("gone"), StatusCode::NOT_FOUND),
            (
                DomainError::service_unavailable("down"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DomainError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (domain, status) in cases {
            assert_eq!(ApiError::from(domain).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn internal_messages_are_redacted() {
        let err = ApiError::from(DomainError::internal("secret detail"));
        let response = err.error_response();
        let bytes = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("readable body");
        let value: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("Internal server error")
        );
    }
}
