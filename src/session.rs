//! Login, refresh and logout on top of the token service and the stores.
//!
//! Session state lives entirely in the `refresh_tokens` table: a session is
//! live while its row is unrevoked and unexpired.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{Database, UserProfile};
use crate::jwt::{JwtConfig, hash_token};
use crate::password::{verify_password, waste_verification};

/// Failures of the session operations.
///
/// Every variant except `Database` and `Internal` reaches the client as the
/// same generic 401.
#[derive(Debug)]
pub enum AuthError {
    /// Unknown email, disabled account, or wrong password
    InvalidCredentials,
    /// Refresh token failed signature, expiry or type checks,
    /// or its owner can no longer sign in
    InvalidToken,
    /// Refresh token verified but has no live row in the store
    TokenRevokedOrUnknown,
    Database(sqlx::Error),
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenRevokedOrUnknown => write!(f, "Token revoked or unknown"),
            AuthError::Database(e) => write!(f, "Database error: {}", e),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Refresh token lifetime in seconds, used as the cookie Max-Age
    pub refresh_max_age: u64,
    pub user: UserProfile,
}

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub access_token: String,
    pub user_id: i64,
}

#[derive(Clone)]
pub struct SessionService {
    db: Database,
    jwt: Arc<JwtConfig>,
}

impl SessionService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        Self { db, jwt }
    }

    /// Check credentials and open a new session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let user = match self.db.users().get_by_email(email).await? {
            Some(user) if user.is_active() => user,
            Some(user) => {
                waste_verification(password.to_string()).await;
                info!(user_id = user.id, "Login rejected for disabled account");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                waste_verification(password.to_string()).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = verify_password(password.to_string(), user.password_hash.clone())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !matches {
            info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access = self
            .jwt
            .generate_access_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh = self
            .jwt
            .generate_refresh_token(user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.db
            .tokens()
            .create(user.id, &hash_token(&refresh.token), refresh.expires_at)
            .await?;

        info!(user_id = user.id, role = user.role.as_str(), "User logged in");

        Ok(LoginSession {
            access_token: access.token,
            refresh_token: refresh.token,
            refresh_max_age: refresh.duration,
            user: user.profile(),
        })
    }

    /// Issue a new access token for a live refresh token.
    /// The refresh token itself stays valid, so repeated calls all succeed.
    pub async fn rotate(&self, raw: &str) -> Result<RotatedSession, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(raw)
            .map_err(|_| AuthError::InvalidToken)?;

        let record = self
            .db
            .tokens()
            .get_unrevoked_by_hash(&hash_token(raw))
            .await?
            .ok_or(AuthError::TokenRevokedOrUnknown)?;

        if record.user_id != claims.id {
            warn!(
                token_id = record.id,
                "Refresh token owner does not match its claims"
            );
            return Err(AuthError::TokenRevokedOrUnknown);
        }

        if record.expired {
            self.db.tokens().revoke(record.id).await?;
            return Err(AuthError::TokenRevokedOrUnknown);
        }

        let user = self
            .db
            .users()
            .get_active(record.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let access = self
            .jwt
            .generate_access_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(RotatedSession {
            access_token: access.token,
            user_id: user.id,
        })
    }

    /// Revoke the session behind a refresh token. Missing or unknown tokens are a no-op.
    pub async fn logout(&self, raw: Option<&str>) -> Result<(), AuthError> {
        let Some(raw) = raw.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let revoked = self.db.tokens().revoke_by_hash(&hash_token(raw)).await?;
        if revoked > 0 {
            info!("Session revoked on logout");
        }
        Ok(())
    }
}
