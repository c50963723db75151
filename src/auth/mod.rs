//! Bearer authentication with role-based access control.
//!
//! Short-lived access tokens travel in the `Authorization` header and are
//! verified statelessly by [`bearer_guard`]. Refresh tokens live in the
//! `rt` cookie, scoped to `/api/auth`.

mod cookie;
mod errors;
mod extractors;
mod guards;
mod ip;
mod types;

pub use cookie::{
    REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH, clear_refresh_cookie, get_cookie, refresh_cookie,
};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use guards::{bearer_guard, role_guard};
pub use ip::{HasHeadersAndExtensions, extract_client_ip};
pub use types::{AllowedRoles, Identity};
