//! Default staff accounts for a fresh database.

use tracing::info;

use crate::db::{Database, NewUser, Role};
use crate::password::{PasswordError, hash_password};

/// Password given to every seeded account.
const SEED_PASSWORD: &str = "password123";

struct SeedUser {
    name: &'static str,
    email: &'static str,
    role: Role,
    position: &'static str,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        name: "Danny Tighe",
        email: "danny@tbs.local",
        role: Role::Admin,
        position: "Managing Director",
    },
    SeedUser {
        name: "Pat",
        email: "pat@tbs.local",
        role: Role::Foreman,
        position: "Foreman",
    },
    SeedUser {
        name: "Adam",
        email: "adam@tbs.local",
        role: Role::Foreman,
        position: "Foreman",
    },
    SeedUser {
        name: "Charlie",
        email: "charlie@tbs.local",
        role: Role::Labourer,
        position: "Labourer",
    },
];

#[derive(Debug)]
pub enum SeedError {
    Database(sqlx::Error),
    Password(PasswordError),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Database(e) => write!(f, "Failed to seed users: {}", e),
            SeedError::Password(e) => write!(f, "Failed to hash seed password: {}", e),
        }
    }
}

impl std::error::Error for SeedError {}

/// Create the default accounts when the users table is empty.
/// Returns the number of users created; zero if any user already exists.
pub async fn seed_default_users(db: &Database) -> Result<usize, SeedError> {
    let existing = db.users().count().await.map_err(SeedError::Database)?;
    if existing > 0 {
        return Ok(0);
    }

    let password_hash = hash_password(SEED_PASSWORD.to_string())
        .await
        .map_err(SeedError::Password)?;

    for seed in SEED_USERS {
        db.users()
            .create(&NewUser {
                name: seed.name,
                email: seed.email,
                phone: None,
                role: seed.role,
                position: Some(seed.position),
                password_hash: &password_hash,
            })
            .await
            .map_err(SeedError::Database)?;
    }

    info!(count = SEED_USERS.len(), "Seeded default users");
    Ok(SEED_USERS.len())
}
