//! Caller identity.
//!
//! Users are not stored by this service: an [`AuthProvider`] turns a bearer
//! token into a [`UserId`], and the [`AuthUser`] extractor applies it to
//! every authenticated route.
//!
//! - [`jwt`]: HS256 JWT validation.
//! - [`extractor`]: the axum `Authorization: Bearer` extractor.

pub mod extractor;
pub mod jwt;

use std::fmt;

use crate::domain::UserId;
use crate::error::SwapError;

pub use extractor::AuthUser;
pub use jwt::{Claims, JwtAuthProvider};

/// Resolves a bearer token to the user it identifies.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// Validates `token` and returns the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Unauthenticated`] if the token is malformed,
    /// expired, or not signed by a trusted key.
    fn authenticate(&self, token: &str) -> Result<UserId, SwapError>;
}
