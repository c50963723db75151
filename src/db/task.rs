use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "in_progress" => TaskStatus::InProgress,
            "blocked" => TaskStatus::Blocked,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "low" => TaskPriority::Low,
            "high" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }
}

/// A task with the display names of its project and assignees.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_staff_id: Option<i64>,
    pub assignee_contractor_id: Option<i64>,
    pub due_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub project_ref: String,
    pub project_address: String,
    pub staff_name: Option<String>,
    pub contractor_company: Option<String>,
    pub contractor_contact: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    project_id: i64,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    assignee_staff_id: Option<i64>,
    assignee_contractor_id: Option<i64>,
    due_date: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
    project_ref: String,
    project_address: String,
    staff_name: Option<String>,
    contractor_company: Option<String>,
    contractor_contact: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status: TaskStatus::from_db(&row.status),
            priority: TaskPriority::from_db(&row.priority),
            assignee_staff_id: row.assignee_staff_id,
            assignee_contractor_id: row.assignee_contractor_id,
            due_date: row.due_date,
            start_date: row.start_date,
            end_date: row.end_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            project_ref: row.project_ref,
            project_address: row.project_address,
            staff_name: row.staff_name,
            contractor_company: row.contractor_company,
            contractor_contact: row.contractor_contact,
        }
    }
}

pub struct NewTask<'a> {
    pub project_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_staff_id: Option<i64>,
    pub assignee_contractor_id: Option<i64>,
    pub due_date: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Partial update. `None` keeps the current value; for assignees,
/// `Some(None)` clears the assignment.
#[derive(Default)]
pub struct TaskUpdate<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_staff_id: Option<Option<i64>>,
    pub assignee_contractor_id: Option<Option<i64>>,
    pub due_date: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// List filters. Unset fields match everything.
#[derive(Debug, Default)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub assignee_staff_id: Option<i64>,
    pub assignee_contractor_id: Option<i64>,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &NewTask<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tasks (project_id, title, description, status, priority, assignee_staff_id, assignee_contractor_id, due_date, start_date, end_date, notes) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.project_id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.assignee_staff_id)
        .bind(task.assignee_contractor_id)
        .bind(task.due_date)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.notes)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT t.id, t.project_id, t.title, t.description, t.status, t.priority, t.assignee_staff_id, t.assignee_contractor_id, t.due_date, t.start_date, t.end_date, t.notes, t.created_at, t.updated_at,
                    p.ref AS project_ref, p.address AS project_address, u.name AS staff_name, c.company AS contractor_company, c.contact_name AS contractor_contact
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             LEFT JOIN users u ON u.id = t.assignee_staff_id
             LEFT JOIN contractors c ON c.id = t.assignee_contractor_id
             WHERE t.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Task::from))
    }

    /// List tasks matching the filter: high priority first, then by due date
    /// with undated tasks last.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, sqlx::Error> {
        let status = filter.status.map(|s| s.as_str());
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT t.id, t.project_id, t.title, t.description, t.status, t.priority, t.assignee_staff_id, t.assignee_contractor_id, t.due_date, t.start_date, t.end_date, t.notes, t.created_at, t.updated_at,
                    p.ref AS project_ref, p.address AS project_address, u.name AS staff_name, c.company AS contractor_company, c.contact_name AS contractor_contact
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             LEFT JOIN users u ON u.id = t.assignee_staff_id
             LEFT JOIN contractors c ON c.id = t.assignee_contractor_id
             WHERE (? IS NULL OR t.project_id = ?)
               AND (? IS NULL OR t.status = ?)
               AND (? IS NULL OR t.assignee_staff_id = ?)
               AND (? IS NULL OR t.assignee_contractor_id = ?)
             ORDER BY CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                      t.due_date IS NULL, t.due_date, t.id",
        )
        .bind(filter.project_id)
        .bind(filter.project_id)
        .bind(status)
        .bind(status)
        .bind(filter.assignee_staff_id)
        .bind(filter.assignee_staff_id)
        .bind(filter.assignee_contractor_id)
        .bind(filter.assignee_contractor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Tasks whose scheduled span overlaps `[from, to]` (inclusive ISO dates).
    /// The span runs from the start date (or due date) to the end date
    /// (or due date). Tasks with no dates at all are skipped.
    pub async fn list_scheduled(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT t.id, t.project_id, t.title, t.description, t.status, t.priority, t.assignee_staff_id, t.assignee_contractor_id, t.due_date, t.start_date, t.end_date, t.notes, t.created_at, t.updated_at,
                    p.ref AS project_ref, p.address AS project_address, u.name AS staff_name, c.company AS contractor_company, c.contact_name AS contractor_contact
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             LEFT JOIN users u ON u.id = t.assignee_staff_id
             LEFT JOIN contractors c ON c.id = t.assignee_contractor_id
             WHERE COALESCE(t.start_date, t.due_date, t.end_date) IS NOT NULL
               AND (? IS NULL OR COALESCE(t.start_date, t.due_date, t.end_date) <= ?)
               AND (? IS NULL OR COALESCE(t.end_date, t.due_date, t.start_date) >= ?)
             ORDER BY COALESCE(t.start_date, t.due_date, t.end_date), t.id",
        )
        .bind(to)
        .bind(to)
        .bind(from)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Apply a partial update and bump `updated_at`.
    pub async fn update(&self, id: i64, update: &TaskUpdate<'_>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                assignee_staff_id = CASE WHEN ? THEN ? ELSE assignee_staff_id END,
                assignee_contractor_id = CASE WHEN ? THEN ? ELSE assignee_contractor_id END,
                due_date = COALESCE(?, due_date),
                start_date = COALESCE(?, start_date),
                end_date = COALESCE(?, end_date),
                notes = COALESCE(?, notes),
                updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(update.title)
        .bind(update.description)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.priority.map(|p| p.as_str()))
        .bind(update.assignee_staff_id.is_some())
        .bind(update.assignee_staff_id.flatten())
        .bind(update.assignee_contractor_id.is_some())
        .bind(update.assignee_contractor_id.flatten())
        .bind(update.due_date)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(update.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a task done without removing it.
    pub async fn complete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET status = 'done', updated_at = datetime('now') WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
