//! Session endpoints.
//!
//! - POST `/auth/login` - Check credentials, return an access token and set the refresh cookie
//! - POST `/auth/refresh` - Exchange the refresh cookie for a new access token
//! - POST `/auth/logout` - Revoke the refresh token and clear the cookie

use axum::{
    Json, Router,
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::post,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::ApiError;
use super::extract::ValidJson;
use crate::auth::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
use crate::db::UserProfile;
use crate::rate_limit::{LoginRateLimit, rate_limit_login};
use crate::session::SessionService;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionService,
    pub secure_cookies: bool,
}

pub fn router(state: AuthState, rate_limit: LoginRateLimit) -> Router {
    let login_router = Router::new()
        .route("/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_login))
        .with_state(state.clone());

    Router::new()
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .with_state(state)
        .merge(login_router)
}

#[derive(Deserialize, Validate)]
struct LoginRequest {
    #[validate(length(min = 1, max = 254, message = "is required"))]
    email: String,
    #[validate(length(min = 1, max = 1024, message = "is required"))]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    user: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

async fn login(
    State(state): State<AuthState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    let cookie = refresh_cookie(
        &session.refresh_token,
        session.refresh_max_age,
        state.secure_cookies,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            access_token: session.access_token,
            user: session.user,
        }),
    ))
}

async fn refresh(
    State(state): State<AuthState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, _body) = request.into_parts();

    let raw = get_cookie(&parts.headers, REFRESH_COOKIE_NAME)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh"))?;

    let rotated = state.sessions.rotate(raw).await?;

    Ok(Json(RefreshResponse {
        access_token: rotated.access_token,
    }))
}

async fn logout(
    State(state): State<AuthState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, _body) = request.into_parts();

    state
        .sessions
        .logout(get_cookie(&parts.headers, REFRESH_COOKIE_NAME))
        .await?;

    Ok((
        AppendHeaders([(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))]),
        Json(serde_json::json!({ "ok": true })),
    ))
}
