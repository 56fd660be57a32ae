//! HS256 JWT validation.
//!
//! Tokens are issued elsewhere; this service only checks the signature and
//! expiry and reads the user id from the `sub` claim.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthProvider;
use crate::domain::UserId;
use crate::error::SwapError;

/// JWT claims accepted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    pub sub: Uuid,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// [`AuthProvider`] backed by a shared HMAC secret.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthProvider")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtAuthProvider {
    /// Creates a provider that accepts HS256 tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Signs `claims` with `secret`.
    ///
    /// Used by tests and local tooling; production tokens come from the
    /// identity service.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Internal`] if encoding fails.
    pub fn issue(secret: &str, claims: &Claims) -> Result<String, SwapError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| SwapError::Internal(format!("token encoding failed: {e}")))
    }
}

impl AuthProvider for JwtAuthProvider {
    fn authenticate(&self, token: &str) -> Result<UserId, SwapError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            SwapError::Unauthenticated("invalid or expired token".to_string())
        })?;
        Ok(UserId::from_uuid(data.claims.sub))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn claims(sub: Uuid, exp_offset: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub,
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn valid_token_yields_subject() {
        let sub = Uuid::new_v4();
        let Ok(token) = JwtAuthProvider::issue(SECRET, &claims(sub, 900)) else {
            panic!("token should encode");
        };
        let provider = JwtAuthProvider::new(SECRET);
        assert!(matches!(provider.authenticate(&token), Ok(user) if *user.as_uuid() == sub));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60 second leeway.
        let Ok(token) = JwtAuthProvider::issue(SECRET, &claims(Uuid::new_v4(), -300)) else {
            panic!("token should encode");
        };
        let provider = JwtAuthProvider::new(SECRET);
        assert!(matches!(
            provider.authenticate(&token),
            Err(SwapError::Unauthenticated(_))
        ));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let Ok(token) = JwtAuthProvider::issue("another-secret", &claims(Uuid::new_v4(), 900))
        else {
            panic!("token should encode");
        };
        let provider = JwtAuthProvider::new(SECRET);
        assert!(provider.authenticate(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let provider = JwtAuthProvider::new(SECRET);
        assert!(matches!(
            provider.authenticate("not-a-jwt"),
            Err(SwapError::Unauthenticated(_))
        ));
    }
}
