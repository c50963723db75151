//! Read-only aggregates for the dashboard.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct MetricsStore {
    pool: SqlitePool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffCounts {
    pub total: i64,
    pub by_role: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct ContractorCounts {
    pub active: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentProject {
    #[sqlx(rename = "ref")]
    pub reference: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct Overview {
    pub projects: StatusCounts,
    pub tasks: StatusCounts,
    pub staff: StaffCounts,
    pub contractors: ContractorCounts,
    pub recent_projects: Vec<RecentProject>,
}

/// Sum grouped counts into a total and a per-key map.
fn tally(rows: Vec<(String, i64)>) -> (i64, BTreeMap<String, i64>) {
    let total = rows.iter().map(|(_, n)| n).sum();
    (total, rows.into_iter().collect())
}

impl MetricsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn overview(&self) -> Result<Overview, sqlx::Error> {
        let projects: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM projects GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let tasks: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let staff: Vec<(String, i64)> = sqlx::query_as(
            "SELECT role, COUNT(*) FROM users WHERE status = 'active' GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await?;
        let active_contractors: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM contractors WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;
        let recent_projects: Vec<RecentProject> = sqlx::query_as(
            "SELECT ref, created_at FROM projects WHERE created_at >= datetime('now', '-7 days') ORDER BY created_at DESC, id DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;

        let (projects_total, projects_by_status) = tally(projects);
        let (tasks_total, tasks_by_status) = tally(tasks);
        let (staff_total, staff_by_role) = tally(staff);

        Ok(Overview {
            projects: StatusCounts {
                total: projects_total,
                by_status: projects_by_status,
            },
            tasks: StatusCounts {
                total: tasks_total,
                by_status: tasks_by_status,
            },
            staff: StaffCounts {
                total: staff_total,
                by_role: staff_by_role,
            },
            contractors: ContractorCounts {
                active: active_contractors.0,
            },
            recent_projects,
        })
    }
}
