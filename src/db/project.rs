use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ProjectStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    Active,
    OnHold,
    Complete,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "planned",
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Complete => "complete",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "active" => ProjectStatus::Active,
            "on_hold" => ProjectStatus::OnHold,
            "complete" => ProjectStatus::Complete,
            _ => ProjectStatus::Planned,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: String,
    pub address: String,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<String>,
    pub end_date_est: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    #[sqlx(rename = "ref")]
    reference: String,
    address: String,
    client_name: Option<String>,
    status: String,
    start_date: Option<String>,
    end_date_est: Option<String>,
    notes: Option<String>,
    created_by: Option<i64>,
    created_at: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            reference: row.reference,
            address: row.address,
            client_name: row.client_name,
            status: ProjectStatus::from_db(&row.status),
            start_date: row.start_date,
            end_date_est: row.end_date_est,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a project in the `planned` state. Returns the project ID.
    pub async fn create(
        &self,
        reference: &str,
        address: &str,
        client_name: Option<&str>,
        created_by: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO projects (ref, address, client_name, created_by) VALUES (?, ?, ?, ?)",
        )
        .bind(reference)
        .bind(address)
        .bind(client_name)
        .bind(created_by)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT id, ref, address, client_name, status, start_date, end_date_est, notes, created_by, created_at FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Project::from))
    }

    /// List all projects, newest first.
    pub async fn list(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT id, ref, address, client_name, status, start_date, end_date_est, notes, created_by, created_at FROM projects ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    pub async fn is_ref_taken(&self, reference: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE ref = ?")
            .bind(reference)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Apply a partial update. `None` fields keep their current value.
    pub async fn update(
        &self,
        id: i64,
        status: Option<ProjectStatus>,
        notes: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET status = COALESCE(?, status), notes = COALESCE(?, notes) WHERE id = ?",
        )
        .bind(status.map(|s| s.as_str()))
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
