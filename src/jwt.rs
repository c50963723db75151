//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with separate secrets, so a token of
//! one kind never verifies as the other even before the type marker is checked.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::{Role, User};

/// Minimum accepted length of each signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted access token lifetime (one day).
pub const MAX_ACCESS_TTL_MINUTES: u64 = 24 * 60;

/// Longest accepted refresh token lifetime (one year).
pub const MAX_REFRESH_TTL_DAYS: u64 = 365;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived, stateless bearer token
    Access,
    /// Long-lived cookie token, tracked in the database by hash
    Refresh,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub id: i64,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub id: i64,
    /// Random token ID; keeps tokens minted in the same second distinct
    pub jti: String,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    pub iat: u64,
    pub exp: u64,
}

/// Secrets and lifetimes for token issuance.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl TokenSettings {
    /// Check that both secrets are long enough and not identical, and that
    /// both lifetimes fall within their bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "Access token secret must be at least {} bytes",
                MIN_SECRET_LEN
            ));
        }
        if self.refresh_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "Refresh token secret must be at least {} bytes",
                MIN_SECRET_LEN
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err("Access and refresh token secrets must differ".to_string());
        }
        if self.access_ttl_minutes == 0 || self.refresh_ttl_days == 0 {
            return Err("Token lifetimes must be greater than zero".to_string());
        }
        if self.access_ttl_minutes > MAX_ACCESS_TTL_MINUTES {
            return Err(format!(
                "Access token lifetime must not exceed {} minutes",
                MAX_ACCESS_TTL_MINUTES
            ));
        }
        if self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(format!(
                "Refresh token lifetime must not exceed {} days",
                MAX_REFRESH_TTL_DAYS
            ));
        }
        Ok(())
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_duration: u64,
    refresh_duration: u64,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    pub token: String,
    pub jti: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

impl JwtConfig {
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(&settings.access_secret),
            access_decoding: DecodingKey::from_secret(&settings.access_secret),
            refresh_encoding: EncodingKey::from_secret(&settings.refresh_secret),
            refresh_decoding: DecodingKey::from_secret(&settings.refresh_secret),
            access_duration: settings.access_ttl_minutes.saturating_mul(60),
            refresh_duration: settings.refresh_ttl_days.saturating_mul(24 * 60 * 60),
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_duration(&self) -> u64 {
        self.access_duration
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_duration(&self) -> u64 {
        self.refresh_duration
    }

    /// Generate an access token carrying the user's identity.
    pub fn generate_access_token(&self, user: &User) -> Result<AccessTokenResult, JwtError> {
        let now = now_secs()?;

        let claims = AccessClaims {
            id: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
            token_type: TokenType::Access,
            iat: now,
            exp: now.saturating_add(self.access_duration),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            duration: self.access_duration,
        })
    }

    /// Generate a refresh token for a user.
    pub fn generate_refresh_token(&self, user_id: i64) -> Result<RefreshTokenResult, JwtError> {
        let now = now_secs()?;

        let jti = uuid::Uuid::new_v4().to_string();
        let exp = now.saturating_add(self.refresh_duration);

        let claims = RefreshClaims {
            id: user_id,
            jti: jti.clone(),
            token_type: TokenType::Refresh,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshTokenResult {
            token,
            jti,
            expires_at: exp,
            duration: self.refresh_duration,
        })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.access_decoding, &validation())
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

/// Hex-encoded SHA-256 of a raw token, as stored in `refresh_tokens.token_hash`.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature, malformed token, or expired
    Decoding(jsonwebtoken::errors::Error),
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}
