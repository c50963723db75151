#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use std::net::SocketAddr;
use tbs::{
    ServerConfig, create_app,
    db::Database,
    jwt::{JwtConfig, TokenSettings},
    rate_limit::LoginRateLimit,
    seed::seed_default_users,
};
use tower::ServiceExt;

pub const PASSWORD: &str = "password123";

/// A router wired like production, plus direct handles on its state.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub jwt: JwtConfig,
    pub tokens: TokenSettings,
}

pub fn test_token_settings() -> TokenSettings {
    TokenSettings {
        access_secret: b"integration-access-secret-0123456789abcdef".to_vec(),
        refresh_secret: b"integration-refresh-secret-0123456789abcdef".to_vec(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 7,
    }
}

/// App over a seeded in-memory database with a generous login limit.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_burst(1000).await
}

pub async fn create_test_app_with_burst(login_burst: u32) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    seed_default_users(&db).await.expect("Failed to seed users");

    let tokens = test_token_settings();
    let config = ServerConfig {
        db: db.clone(),
        tokens: tokens.clone(),
        secure_cookies: true,
        login_limit: LoginRateLimit::new(login_burst, false),
    };
    let router =
        create_app(&config).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    TestApp {
        router,
        jwt: JwtConfig::new(&tokens),
        db,
        tokens,
    }
}

/// Response status, headers and JSON body (Null when empty or not JSON).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// Value of the `rt` cookie set by this response, if any.
    pub fn refresh_cookie(&self) -> Option<String> {
        self.set_cookies().iter().find_map(|c| {
            c.split(';')
                .next()
                .and_then(|pair| pair.strip_prefix("rt="))
                .map(String::from)
        })
    }
}

pub struct TestRequest<'a> {
    pub method: Method,
    pub uri: &'a str,
    pub bearer: Option<&'a str>,
    pub cookie: Option<&'a str>,
    pub body: Option<serde_json::Value>,
}

impl<'a> TestRequest<'a> {
    pub fn new(method: Method, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            bearer: None,
            cookie: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn cookie(mut self, cookie: &'a str) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub async fn send(app: &Router, req: TestRequest<'_>) -> TestResponse {
    let mut builder = Request::builder().method(req.method).uri(req.uri);
    if let Some(token) = req.bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(cookie) = req.cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match req.body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        headers,
        json,
    }
}

pub async fn get(app: &Router, uri: &str, bearer: &str) -> TestResponse {
    send(app, TestRequest::new(Method::GET, uri).bearer(bearer)).await
}

/// Log in and return (access token, raw refresh token).
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let response = send(
        app,
        TestRequest::new(Method::POST, "/api/auth/login")
            .json(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(
        response.status,
        StatusCode::OK,
        "login failed: {}",
        response.json
    );

    let access = response.json["accessToken"]
        .as_str()
        .expect("accessToken missing")
        .to_string();
    let refresh = response.refresh_cookie().expect("rt cookie missing");
    (access, refresh)
}

pub async fn login_admin(app: &Router) -> String {
    login(app, "danny@tbs.local", PASSWORD).await.0
}

pub async fn user_id(db: &Database, email: &str) -> i64 {
    db.users()
        .get_by_email(email)
        .await
        .unwrap()
        .expect("user missing")
        .id
}

pub async fn active_sessions(db: &Database, user_id: i64) -> usize {
    db.tokens().list_active_by_user(user_id).await.unwrap().len()
}
