//! Handler errors and their JSON rendering.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde_json::{Value, json};

use crate::chat::store::StoreError;

/// Every way an endpoint can fail. Rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum HandlerError {
    /// 400 with a caller-facing message.
    BadRequest(&'static str),
    /// 401 with a fixed message. Token details are never echoed.
    Unauthorized(&'static str),
    Forbidden(String),
    NotFound(String),
    MethodNotAllowed,
    /// The LLM answered with a non-success status; its body is relayed.
    Upstream { status: StatusCode, details: Value },
    /// Logged in full, answered with the public message only.
    Internal { public: &'static str, cause: String },
}

impl HandlerError {
    pub fn internal(public: &'static str, cause: impl fmt::Display) -> Self {
        HandlerError::Internal {
            public,
            cause: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HandlerError::Forbidden(_) => StatusCode::FORBIDDEN,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Upstream { status, .. } => *status,
            HandlerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::BadRequest(msg) | HandlerError::Unauthorized(msg) => write!(f, "{msg}"),
            HandlerError::Forbidden(msg) | HandlerError::NotFound(msg) => write!(f, "{msg}"),
            HandlerError::MethodNotAllowed => write!(f, "Method not allowed"),
            HandlerError::Upstream { status, .. } => {
                write!(f, "Error from AI service (HTTP {})", status.as_u16())
            }
            HandlerError::Internal { public, cause } => write!(f, "{public}: {cause}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => HandlerError::NotFound(err.to_string()),
            StoreError::Forbidden => HandlerError::Forbidden(err.to_string()),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            HandlerError::Upstream { details, .. } => {
                warn!("AI service error: {}", details);
                json!({ "error": "Error from AI service", "details": details })
            }
            HandlerError::Internal { public, cause } => {
                error!("{}: {}", public, cause);
                json!({ "error": public })
            }
            other => {
                warn!("{} {}", status.as_u16(), other);
                json!({ "error": other.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Fallback for routes hit with a verb they do not serve.
pub async fn method_not_allowed() -> HandlerError {
    HandlerError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        assert_eq!(
            HandlerError::from(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HandlerError::from(StoreError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_hides_cause_from_display_status() {
        let err = HandlerError::internal("Internal server error", "boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error: boom");
    }

    #[test]
    fn test_upstream_keeps_status() {
        let err = HandlerError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            details: json!({"error": {"message": "rate limited"}}),
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
