//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use projections::ProjectionError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, caught before any service call.
    BadRequest(String),
    /// Error from a write-side service.
    Domain(DomainError),
    /// Error from a report query.
    Projection(ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Projection(err) => projection_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyFulfilled(_)
        | DomainError::InvalidState { .. }
        | DomainError::InsufficientStock { .. }
        | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::PasswordHashing(_)
        | DomainError::InvariantViolation(_)
        | DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn projection_error_to_response(err: ProjectionError) -> (StatusCode, String) {
    let status = match &err {
        ProjectionError::InvalidInventoryType(_) => StatusCode::BAD_REQUEST,
        ProjectionError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        ProjectionError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
