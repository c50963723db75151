pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod request_log;
pub mod seed;
pub mod session;

use api::create_api_router;
use axum::{Router, middleware};
use db::Database;
use jwt::{JwtConfig, TokenSettings};
use rate_limit::LoginRateLimit;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing secrets and token lifetimes
    pub tokens: TokenSettings,
    /// Whether to set the Secure flag on the refresh cookie
    pub secure_cookies: bool,
    /// Per-IP login throttle, shared with the cleanup scheduler
    pub login_limit: LoginRateLimit,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.tokens));
    let api_router = create_api_router(
        config.db.clone(),
        jwt,
        config.secure_cookies,
        config.login_limit.clone(),
    );

    Router::new()
        .nest("/api", api_router)
        .layer(middleware::from_fn(request_log::log_request))
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub fn init_cleanup(config: &ServerConfig) -> tokio::task::JoinHandle<()> {
    cleanup::spawn_cleanup_scheduler(config.db.clone(), config.login_limit.clone())
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
