//! Bearer-token extractor for axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::SwapError;

/// Authenticated caller, resolved from `Authorization: Bearer <token>`.
///
/// Handlers that take an `AuthUser` reject unauthenticated requests with
/// 401 before any service code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// The caller's user id.
    #[must_use]
    pub const fn id(self) -> UserId {
        self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = SwapError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SwapError::Unauthenticated("missing Authorization header".into()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            SwapError::Unauthenticated("expected Authorization: Bearer <token>".into())
        })?;

        state.auth.authenticate(token.trim()).map(AuthUser)
    }
}
