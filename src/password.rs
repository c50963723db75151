//! Password hashing with bcrypt.
//!
//! bcrypt is deliberately slow, so every call runs on the blocking thread pool.

use std::sync::LazyLock;

/// bcrypt work factor for stored password hashes.
pub const BCRYPT_COST: u32 = 10;

/// Hash compared against when the account does not exist, so a failed lookup
/// costs as much as a failed password check.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("tbs-dummy-password", BCRYPT_COST).ok());

/// Errors that can occur while hashing or verifying passwords.
#[derive(Debug)]
pub enum PasswordError {
    Hash(bcrypt::BcryptError),
    /// The blocking task panicked or was cancelled.
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(e) => write!(f, "Password hashing failed: {}", e),
            PasswordError::Task(e) => write!(f, "Password hashing task failed: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a plaintext password.
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(PasswordError::Task)?
        .map_err(PasswordError::Hash)
}

/// Check a plaintext password against a stored hash.
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(PasswordError::Task)
}

/// Spend the same effort as a real verification without checking anything.
pub async fn waste_verification(password: String) {
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = bcrypt::verify(password, hash);
        }
    })
    .await;
}
