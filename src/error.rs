//! Service error types with HTTP status code mapping.
//!
//! [`SwapError`] is the central error type for the gateway. Each variant
//! belongs to one [`ErrorKind`] of the error taxonomy and maps to a specific
//! HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ProposalId, SlotId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "conflict: both slots must be SWAPPABLE",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`SwapError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error taxonomy shared by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; the caller must retry with different input.
    Validation,
    /// The caller lacks rights over the referenced entity.
    Authorization,
    /// The referenced entity does not exist.
    NotFound,
    /// A state precondition was violated; retriable after re-reading state.
    Conflict,
    /// Infrastructure failure unrelated to the request itself.
    Infrastructure,
}

impl ErrorKind {
    /// Returns `true` if the same request may succeed once the caller has
    /// re-read the current state.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | Not Found/State | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 4000–4999 | Authorization   | 401 Unauthorized / 403       |
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unknown slot status string.
    #[error("invalid slot status: {0}")]
    InvalidSlotStatus(String),

    /// Slot with the given ID was not found.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// Swap proposal with the given ID was not found.
    #[error("swap request not found: {0}")]
    ProposalNotFound(ProposalId),

    /// A state precondition did not hold.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request carried no valid identity.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The authenticated user has no rights over the referenced entity.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidSlotStatus(_) => ErrorKind::Validation,
            Self::SlotNotFound(_) | Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthenticated(_) | Self::Forbidden(_) => ErrorKind::Authorization,
            Self::Persistence(_) | Self::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidSlotStatus(_) => 1002,
            Self::SlotNotFound(_) => 2001,
            Self::ProposalNotFound(_) => 2002,
            Self::Conflict(_) => 2101,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Unauthenticated(_) => 4001,
            Self::Forbidden(_) => 4003,
        }
    }

    /// Message safe to return to clients.
    ///
    /// Infrastructure errors carry driver or internal detail that is logged
    /// but replaced by a fixed message on the wire.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Persistence(_) | Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidSlotStatus(_) => StatusCode::BAD_REQUEST,
            Self::SlotNotFound(_) | Self::ProposalNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for SwapError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::Conflict(format!(
                "duplicate value violates unique constraint: {}",
                db.constraint().unwrap_or("unknown")
            )),
            _ => Self::Persistence(err.to_string()),
        }
    }
}

impl IntoResponse for SwapError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_kinds() {
        assert_eq!(
            SwapError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SwapError::SlotNotFound(SlotId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(SwapError::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(
            SwapError::Unauthenticated("x".into()).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            SwapError::Forbidden("x".into()).kind(),
            ErrorKind::Authorization
        );
    }

    #[test]
    fn only_conflict_is_retriable() {
        assert!(ErrorKind::Conflict.is_retriable());
        assert!(!ErrorKind::Validation.is_retriable());
        assert!(!ErrorKind::Authorization.is_retriable());
        assert!(!ErrorKind::NotFound.is_retriable());
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            SwapError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            SwapError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SwapError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SwapError::ProposalNotFound(ProposalId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn infrastructure_detail_stays_out_of_message() {
        let err = SwapError::Persistence("connection refused to 10.0.0.7:5432".into());
        assert!(!err.public_message().contains("10.0.0.7"));
        assert!(err.to_string().contains("10.0.0.7"));

        let err = SwapError::Internal("task join failed".into());
        assert_eq!(err.public_message(), "An internal error occurred");

        let err = SwapError::Conflict("both slots must be SWAPPABLE".into());
        assert_eq!(err.public_message(), err.to_string());
    }

    #[tokio::test]
    async fn persistence_response_body_is_generic() {
        use http_body_util::BodyExt;

        let response =
            SwapError::Persistence("error returned from database: relation missing".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let Ok(collected) = response.into_body().collect().await else {
            panic!("body should be readable");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&collected.to_bytes()) else {
            panic!("body should be JSON");
        };
        assert_eq!(json["error"]["code"], 3001);
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn into_response_sets_status() {
        let response = SwapError::InvalidSlotStatus("MAYBE".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
