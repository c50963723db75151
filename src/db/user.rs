use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Staff role used for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Foreman,
    Worker,
    Contractor,
    Labourer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Foreman,
        Role::Worker,
        Role::Contractor,
        Role::Labourer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Foreman => "foreman",
            Role::Worker => "worker",
            Role::Contractor => "contractor",
            Role::Labourer => "labourer",
        }
    }

    /// Parse a role name. Returns `None` for anything outside the enumeration.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// Map a stored value back to a role. The schema constrains the column,
    /// so the fallback only applies to hand-edited rows and grants the least access.
    fn from_db(s: &str) -> Self {
        Self::parse(s).unwrap_or(Role::Labourer)
    }
}

/// Account status. Only active accounts may authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "active" => UserStatus::Active,
            _ => UserStatus::Disabled,
        }
    }
}

/// Full user record including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub position: Option<String>,
    pub password_hash: String,
    pub status: UserStatus,
    pub created_at: String,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Sanitized identity returned by login and `/api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Staff listing entry. Does not expose the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub position: Option<String>,
    pub status: UserStatus,
    pub created_at: String,
}

impl From<User> for StaffMember {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            position: user.position,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Fields required to onboard a new user.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub role: Role,
    pub position: Option<&'a str>,
    pub password_hash: &'a str,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    position: Option<String>,
    password_hash: String,
    status: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: Role::from_db(&row.role),
            position: row.position,
            password_hash: row.password_hash,
            status: UserStatus::from_db(&row.status),
            created_at: row.created_at,
        }
    }
}

/// Canonical form of an email address: trimmed and lower-cased.
/// Applied on every write and every lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new active user. Returns the user ID.
    pub async fn create(&self, user: &NewUser<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, phone, role, position, password_hash, status) VALUES (?, ?, ?, ?, ?, ?, 'active')",
        )
        .bind(user.name)
        .bind(normalize_email(user.email))
        .bind(user.phone)
        .bind(user.role.as_str())
        .bind(user.position)
        .bind(user.password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by ID, regardless of status.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, role, position, password_hash, status, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by email, regardless of status.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, role, position, password_hash, status, created_at FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get an active user by ID.
    pub async fn get_active(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, role, position, password_hash, status, created_at FROM users WHERE id = ? AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// List every user ordered by name.
    pub async fn list_all(&self) -> Result<Vec<StaffMember>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, role, position, password_hash, status, created_at FROM users ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| StaffMember::from(User::from(row)))
            .collect())
    }

    /// List active users ordered by name, optionally restricted to the given roles.
    /// An empty role slice means no role filter.
    pub async fn list_active(&self, roles: &[Role]) -> Result<Vec<StaffMember>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, role, position, password_hash, status, created_at FROM users WHERE status = 'active' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(User::from)
            .filter(|user| roles.is_empty() || roles.contains(&user.role))
            .map(StaffMember::from)
            .collect())
    }

    /// Check whether an email is already registered, optionally ignoring one user.
    pub async fn is_email_taken(
        &self,
        email: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != COALESCE(?, -1)")
                .bind(normalize_email(email))
                .bind(except_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Persist the mutable profile fields of a user.
    pub async fn update(&self, user: &User) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, email = ?, phone = ?, role = ?, position = ?, status = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(normalize_email(&user.email))
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.position)
        .bind(user.status.as_str())
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by ID. Refresh tokens cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of active admins other than the given user.
    pub async fn count_active_admins_except(&self, id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND status = 'active' AND id != ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    /// Total number of users.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
