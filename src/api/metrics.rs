//! Dashboard overview.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use super::error::{ApiError, ResultExt};
use crate::db::{Database, RecentProject};

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/metrics/overview", get(overview))
        .with_state(db)
}

#[derive(Debug, Serialize)]
struct Activity {
    #[serde(rename = "type")]
    kind: &'static str,
    description: String,
    timestamp: String,
    user: &'static str,
}

impl From<RecentProject> for Activity {
    fn from(project: RecentProject) -> Self {
        Self {
            kind: "project_created",
            description: format!("New project '{}' started", project.reference),
            timestamp: project.created_at,
            user: "System",
        }
    }
}

async fn overview(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let overview = db
        .metrics()
        .overview()
        .await
        .db_err("Failed to load metrics")?;

    let activity: Vec<Activity> = overview
        .recent_projects
        .into_iter()
        .map(Activity::from)
        .collect();

    Ok(Json(serde_json::json!({
        "projects": overview.projects,
        "tasks": overview.tasks,
        "staff": overview.staff,
        "contractors": overview.contractors,
        "recentActivity": activity,
    })))
}
