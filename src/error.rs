use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    services::{computations::ComputationError, images::ImageError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The actor lacks the required capability.
    #[error("{0}")]
    Forbidden(String),
    /// Submitted fields were rejected. The message is shown to the user as-is.
    #[error("{0}")]
    Validation(String),
    /// A picture could not be stored.
    #[error(transparent)]
    Storage(#[from] ImageError),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A derived computation engine failed.
    #[error(transparent)]
    Computation(#[from] ComputationError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            // Lost race on the unique index: same outcome as the uniqueness check.
            StorageError::DuplicateName { .. } => {
                ServiceError::Validation("Another event with the same name exists".into())
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Caller lacks the required capability.
    #[error("{0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::Storage(source) => AppError::BadRequest(source.to_string()),
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Computation(source) => AppError::Internal(source.to_string()),
        }
    }
}

impl AppError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (ServiceError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Storage(ImageError::UnsupportedFormat("x.exe".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NotFound("jam".into()), StatusCode::NOT_FOUND),
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn duplicate_name_reads_as_validation_failure() {
        let err: ServiceError = StorageError::DuplicateName {
            name: "jam-1".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Another event with the same name exists");
    }
}
