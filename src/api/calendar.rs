//! Calendar feed built from scheduled tasks.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::{Deserialize, Serialize};

use super::dates::is_iso_date;
use super::error::{ApiError, ResultExt};
use super::extract::ValidQuery;
use crate::db::{Database, Task, TaskStatus};

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/calendar/events", get(list_events))
        .with_state(db)
}

#[derive(Deserialize)]
struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Serialize)]
struct Event {
    id: String,
    task_id: i64,
    project_id: i64,
    project_ref: String,
    title: String,
    start: String,
    end: String,
    status: TaskStatus,
}

impl Event {
    /// A task becomes an event spanning its start (or due) date to its end
    /// (or due) date. Tasks without any date have no event.
    fn from_task(task: Task) -> Option<Self> {
        let start = task
            .start_date
            .clone()
            .or_else(|| task.due_date.clone())
            .or_else(|| task.end_date.clone())?;
        let end = task
            .end_date
            .or(task.due_date)
            .unwrap_or_else(|| start.clone());
        Some(Self {
            id: format!("task-{}", task.id),
            task_id: task.id,
            project_id: task.project_id,
            project_ref: task.project_ref,
            title: task.title,
            start,
            end,
            status: task.status,
        })
    }
}

fn check_bound(value: Option<&str>, name: &str) -> Result<(), ApiError> {
    match value {
        Some(v) if !is_iso_date(v) => Err(ApiError::bad_request(format!(
            "{}: must be a date (YYYY-MM-DD)",
            name
        ))),
        _ => Ok(()),
    }
}

async fn list_events(
    State(db): State<Database>,
    ValidQuery(range): ValidQuery<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, to) = (range.from.as_deref(), range.to.as_deref());
    check_bound(from, "from")?;
    check_bound(to, "to")?;
    if matches!((from, to), (Some(from), Some(to)) if from > to) {
        return Err(ApiError::bad_request("from: must not be after to"));
    }

    let tasks = db
        .tasks()
        .list_scheduled(from, to)
        .await
        .db_err("Failed to list scheduled tasks")?;

    let events: Vec<Event> = tasks.into_iter().filter_map(Event::from_task).collect();
    Ok(Json(events))
}
