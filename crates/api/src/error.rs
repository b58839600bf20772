//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, StoreError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::ProductNotFound(_)
        | DomainError::OrderNotFound(_)
        | DomainError::CartNotFound
        | DomainError::ItemNotFound(_)
        | DomainError::AddressNotFound(_)
        | DomainError::UserNotFound => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::NotAuthorized => (StatusCode::FORBIDDEN, err.to_string()),
        DomainError::ProductGone
        | DomainError::NoAddressAvailable
        | DomainError::EmptyCart
        | DomainError::InsufficientStock { .. }
        | DomainError::InvalidTransition { .. }
        | DomainError::InvalidStateForCancellation { .. }
        | DomainError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::Store(StoreError::Duplicate(field)) => (
            StatusCode::BAD_REQUEST,
            format!("That {field} is already registered."),
        ),
        DomainError::Store(_) => {
            tracing::error!(error = %err, "storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(DomainError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use common::OrderId;
    use domain::OrderStatus;

    #[test]
    fn status_codes_match_error_classes() {
        let cases = [
            (
                ApiError::Domain(DomainError::OrderNotFound(OrderId::new())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Domain(DomainError::NotAuthorized),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Domain(DomainError::EmptyCart),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Domain(DomainError::InvalidTransition {
                    from: OrderStatus::Shipped,
                    to: OrderStatus::Pending,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Domain(DomainError::Store(StoreError::backend("down"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Unauthorized("no token".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
