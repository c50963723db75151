mod auth;
mod calendar;
mod contractors;
mod dates;
mod error;
mod extract;
mod health;
mod me;
mod metrics;
mod photos;
mod projects;
mod staff;
mod tasks;
mod users;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::auth::bearer_guard;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::LoginRateLimit;
use crate::session::SessionService;

pub use error::{ApiError, ResultExt};
pub use extract::{ValidJson, ValidPath, ValidQuery};

/// Create the API router. Paths are relative to the `/api` mount point.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    rate_limit: LoginRateLimit,
) -> Router {
    let auth_state = auth::AuthState {
        sessions: SessionService::new(db.clone(), jwt.clone()),
        secure_cookies,
    };

    // Everything here requires a bearer token; role checks sit inside each module.
    let protected = Router::new()
        .merge(me::router(db.clone()))
        .merge(users::router(db.clone()))
        .merge(staff::router(db.clone()))
        .merge(projects::router(db.clone()))
        .merge(tasks::router(db.clone()))
        .merge(contractors::router(db.clone()))
        .merge(photos::router(db.clone()))
        .merge(calendar::router(db.clone()))
        .merge(metrics::router(db))
        .route_layer(middleware::from_fn_with_state(jwt, bearer_guard));

    Router::new()
        .merge(auth::router(auth_state, rate_limit))
        .merge(health::router())
        .merge(protected)
}
