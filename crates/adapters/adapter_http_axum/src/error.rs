//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use gasguard_domain::error::{GasGuardError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`GasGuardError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(GasGuardError);

impl From<GasGuardError> for ApiError {
    fn from(err: GasGuardError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GasGuardError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            GasGuardError::NotRegistered(err) => (StatusCode::NOT_FOUND, err.to_string()),
            err if err.is_transient() => {
                tracing::warn!(error = ?err, "transient failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable".to_string(),
                )
            }
            err => {
                tracing::error!(error = %err, "unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
