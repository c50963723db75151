//! Refresh-token cookie parsing and construction.

use axum::http::header;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "rt";

/// The refresh cookie is only sent to the auth endpoints.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Set-Cookie value carrying a freshly issued refresh token.
pub fn refresh_cookie(token: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly{}; SameSite=Lax; Path={}; Max-Age={}",
        REFRESH_COOKIE_NAME, token, secure, REFRESH_COOKIE_PATH, max_age
    )
}

/// Set-Cookie value that removes the refresh cookie.
pub fn clear_refresh_cookie(secure: bool) -> String {
    refresh_cookie("", 0, secure)
}
