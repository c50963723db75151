//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::types::Identity;

/// Reads the identity attached by the bearer guard.
/// Rejects with 401 when the route is not behind the guard.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiAuthError::new(AuthErrorKind::NotAuthenticated))
    }
}
