//! Bearer and role guards, applied with `middleware::from_fn_with_state`.
//!
//! The bearer guard must wrap the role guard: it attaches the [`Identity`]
//! the role guard inspects.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::types::{AllowedRoles, Identity};
use crate::jwt::JwtConfig;

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Require a valid access token. On success the caller's [`Identity`] is
/// attached to the request, and to the response for request logging.
pub async fn bearer_guard(
    State(jwt): State<Arc<JwtConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let token = bearer_token(request.headers())
        .ok_or(ApiAuthError::new(AuthErrorKind::NotAuthenticated))?;

    let claims = jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        ApiAuthError::new(AuthErrorKind::InvalidToken)
    })?;

    let identity = Identity::from(claims);
    request.extensions_mut().insert(identity.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(identity);
    Ok(response)
}

/// Require the caller's role to be in the allow-list.
pub async fn role_guard(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(ApiAuthError::new(AuthErrorKind::NotAuthenticated))?;

    if !allowed.permits(identity.role) {
        tracing::info!(
            user_id = identity.id,
            role = identity.role.as_str(),
            "Role not permitted for route"
        );
        return Err(ApiAuthError::new(AuthErrorKind::InsufficientRole));
    }

    Ok(next.run(request).await)
}
