//! Refresh token storage for session tracking and revocation.
//!
//! Only the SHA-256 hash of a refresh token is stored; the raw token lives in the
//! client's cookie. Access tokens are stateless and never touch this table.

use sqlx::sqlite::SqlitePool;

/// Revoked rows are kept this long as session history before cleanup removes them.
const REVOKED_RETENTION: &str = "-30 days";

/// A stored refresh token record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: String,
    pub revoked_at: Option<String>,
    pub created_at: String,
    /// Whether `expires_at` is in the past, evaluated by the database at query time.
    pub expired: bool,
}

/// Store for managing refresh tokens.
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record the hash of a newly issued refresh token.
    /// `expires_at` is a Unix timestamp.
    pub async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: u64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES (?, ?, datetime(?, 'unixepoch'))",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Find the unrevoked record for a token hash. Expired records are still
    /// returned; check `expired` before trusting them.
    pub async fn get_unrevoked_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, token_hash, expires_at, revoked_at, created_at, expires_at <= datetime('now') AS expired
             FROM refresh_tokens WHERE token_hash = ? AND revoked_at IS NULL
             ORDER BY id DESC LIMIT 1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Revoke a single record by ID.
    pub async fn revoke(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = datetime('now') WHERE id = ? AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every unrevoked record matching a token hash.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = datetime('now') WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke all sessions of a user (logout everywhere).
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = datetime('now') WHERE user_id = ? AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List the usable sessions of a user, newest first.
    pub async fn list_active_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<RefreshTokenRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, token_hash, expires_at, revoked_at, created_at, expires_at <= datetime('now') AS expired
             FROM refresh_tokens
             WHERE user_id = ? AND revoked_at IS NULL AND expires_at > datetime('now')
             ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Delete expired records and records revoked longer ago than the retention window.
    pub async fn delete_stale(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens
             WHERE expires_at <= datetime('now')
                OR (revoked_at IS NOT NULL AND revoked_at < datetime('now', ?))",
        )
        .bind(REVOKED_RETENTION)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
