//! Mapping errors onto HTTP responses

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::protocol::{ErrorBody, ErrorDetail};

/// An error ready to be sent to the client
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ksyk_core::Error> for ApiError {
    fn from(err: ksyk_core::Error) -> Self {
        use ksyk_core::Error;

        if err.is_constraint_violation() {
            return Self::new(StatusCode::CONFLICT, "conflict", err.to_string());
        }
        match err {
            Error::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, "validation_failed", message)
            }
            Error::Authentication(message) => {
                Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
            }
            Error::PermissionDenied(message) => {
                Self::new(StatusCode::FORBIDDEN, "forbidden", message)
            }
            Error::NotFound(message) => Self::not_found(message),
            other => {
                error!(error = %other, "Request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_statuses() {
        let cases = [
            (ksyk_core::Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ksyk_core::Error::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (ksyk_core::Error::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (ksyk_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ksyk_core::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_constraint_violation_is_conflict() {
        let db = ksyk_core::Database::open_in_memory().unwrap();
        let building = ksyk_core::Building::new(
            "M".to_string(),
            ksyk_core::LocalizedText::new("Main", "Pää"),
        );
        db.buildings().create(&building).unwrap();
        let err = db.buildings().create(&building).unwrap_err();
        assert_eq!(ApiError::from(err).status(), StatusCode::CONFLICT);
    }
}
