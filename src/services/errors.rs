//! Service-level errors and their HTTP representation.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::repository::errors::RepositoryError;
use crate::schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(format!("{entity} not found"))
    }

    pub fn unauthorized() -> Self {
        ServiceError::Unauthorized("Unauthorized".to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound("Record not found".to_string()),
            RepositoryError::UniqueViolation(message) => {
                log::info!("Unique violation: {message}");
                ServiceError::Conflict("A record with this value already exists".to_string())
            }
            RepositoryError::ConstraintViolation(message) => {
                log::info!("Constraint violation: {message}");
                ServiceError::Validation("Invalid reference to related data".to_string())
            }
            RepositoryError::ValidationError(message) => ServiceError::Validation(message),
            RepositoryError::StaleWrite(message) => {
                log::warn!("Stale write: {message}");
                ServiceError::Conflict(
                    "The record was changed by another request, please retry".to_string(),
                )
            }
            RepositoryError::ConnectionError(message) => {
                log::error!("Database connection error: {message}");
                ServiceError::Unavailable(
                    "Database temporarily unavailable, please retry".to_string(),
                )
            }
            RepositoryError::DatabaseError(message) | RepositoryError::Unexpected(message) => {
                log::error!("Database error: {message}");
                ServiceError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<ScheduleError> for ServiceError {
    fn from(err: ScheduleError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(format!("Validation failed: {err}"))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) | ServiceError::TypeConstraint(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Status code for an error known only by its message text, e.g. one relayed
/// from an external system.
pub fn categorize_error_message(message: &str) -> StatusCode {
    let message = message.to_lowercase();
    if message.contains("unique constraint") || message.contains("already exists") {
        StatusCode::CONFLICT
    } else if message.contains("not found") || message.contains("no rows") {
        StatusCode::NOT_FOUND
    } else if message.contains("timed out")
        || message.contains("timeout")
        || message.contains("connection")
        || message.contains("database is locked")
    {
        StatusCode::SERVICE_UNAVAILABLE
    } else if message.contains("invalid") || message.contains("required") {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn repository_errors_map_to_status_codes() {
        let cases = [
            (RepositoryError::NotFound, StatusCode::NOT_FOUND),
            (
                RepositoryError::UniqueViolation("tags.name".into()),
                StatusCode::CONFLICT,
            ),
            (
                RepositoryError::ConnectionError("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RepositoryError::DatabaseError("disk I/O".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RepositoryError::ValidationError("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepositoryError::StaleWrite("payment 9".into()),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServiceError::from(err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn error_body_is_json() {
        let response = ServiceError::Conflict("Slot taken".into()).error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Slot taken"}"#);
    }

    #[test]
    fn messages_are_categorized() {
        assert_eq!(
            categorize_error_message("UNIQUE constraint failed: tags.name"),
            StatusCode::CONFLICT
        );
        assert_eq!(
            categorize_error_message("Record to update not found."),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            categorize_error_message("Connection timed out"),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(categorize_error_message("boom"), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
