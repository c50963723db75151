//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Reason a guard rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NotAuthenticated,
    InvalidToken,
    InsufficientRole,
}

/// Guard and extractor rejection, rendered as `{error}` JSON.
#[derive(Debug)]
pub struct ApiAuthError {
    pub(super) kind: AuthErrorKind,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::NotAuthenticated | AuthErrorKind::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthErrorKind::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::InsufficientRole => "Insufficient permissions",
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
