mod contractor;
mod metrics;
mod photo;
mod project;
mod task;
mod token;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use contractor::{Contractor, ContractorStatus, ContractorStore, NewContractor};
pub use metrics::{MetricsStore, Overview, RecentProject};
pub use photo::{NewPhoto, Photo, PhotoFilter, PhotoStore, PhotoTag};
pub use project::{Project, ProjectStatus, ProjectStore};
pub use task::{NewTask, Task, TaskFilter, TaskPriority, TaskStatus, TaskStore, TaskUpdate};
pub use token::{RefreshTokenRecord, RefreshTokenStore};
pub use user::{NewUser, Role, StaffMember, User, UserProfile, UserStatus, UserStore, normalize_email};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Apply every migration newer than the recorded schema version, in order.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        for (index, queries) in MIGRATIONS.iter().enumerate() {
            let target = index as i32 + 1;
            if version < target {
                self.run_migration(target, queries).await?;
                tracing::info!(version = target, "Applied database migration");
            }
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the refresh token store.
    pub fn tokens(&self) -> RefreshTokenStore {
        RefreshTokenStore::new(self.pool.clone())
    }

    /// Get the project store.
    pub fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.pool.clone())
    }

    /// Get the contractor store.
    pub fn contractors(&self) -> ContractorStore {
        ContractorStore::new(self.pool.clone())
    }

    /// Get the task store.
    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.pool.clone())
    }

    /// Get the photo store.
    pub fn photos(&self) -> PhotoStore {
        PhotoStore::new(self.pool.clone())
    }

    /// Get the dashboard aggregation queries.
    pub fn metrics(&self) -> MetricsStore {
        MetricsStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Ordered schema migrations. Entry `n` moves the schema to version `n + 1`.
/// Append only; never edit an entry that has shipped.
const MIGRATIONS: &[&[&str]] = &[
    // v1: credentials and sessions
    &[
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL COLLATE NOCASE,
            phone TEXT,
            role TEXT NOT NULL CHECK (role IN ('admin', 'foreman', 'worker', 'contractor', 'labourer')),
            position TEXT,
            password_hash TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'disabled')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX idx_users_status ON users(status)",
        "CREATE TABLE refresh_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            revoked_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX idx_refresh_tokens_hash ON refresh_tokens(token_hash)",
        "CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
        "CREATE INDEX idx_refresh_tokens_expires_at ON refresh_tokens(expires_at)",
    ],
    // v2: projects
    &[
        "CREATE TABLE projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ref TEXT UNIQUE NOT NULL,
            address TEXT NOT NULL,
            client_name TEXT,
            status TEXT NOT NULL DEFAULT 'planned' CHECK (status IN ('planned', 'active', 'on_hold', 'complete')),
            start_date TEXT,
            end_date_est TEXT,
            notes TEXT,
            created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX idx_projects_created_at ON projects(created_at)",
    ],
    // v3: contractors
    &[
        "CREATE TABLE contractors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company TEXT NOT NULL,
            trade TEXT NOT NULL,
            contact_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            rating INTEGER CHECK (rating BETWEEN 1 AND 5),
            insurance_expiry TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (company, contact_name)
        )",
    ],
    // v4: tasks
    &[
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in_progress', 'blocked', 'done')),
            priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
            assignee_staff_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            assignee_contractor_id INTEGER REFERENCES contractors(id) ON DELETE SET NULL,
            due_date TEXT,
            start_date TEXT,
            end_date TEXT,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX idx_tasks_project_id ON tasks(project_id)",
        "CREATE INDEX idx_tasks_assignee_staff_id ON tasks(assignee_staff_id)",
        "CREATE INDEX idx_tasks_assignee_contractor_id ON tasks(assignee_contractor_id)",
    ],
    // v5: site photos
    &[
        "CREATE TABLE photos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            caption TEXT,
            tag TEXT NOT NULL DEFAULT 'during' CHECK (tag IN ('before', 'during', 'after')),
            uploaded_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        "CREATE INDEX idx_photos_project_id ON photos(project_id)",
    ],
];
