//! Project tasks.
//!
//! Reads are open to any signed-in user. Admins and foremen create and delete
//! tasks; workers may also update them to report progress. Deleting marks a
//! task done unless `?soft=false` is given.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Deserializer};
use tracing::info;
use validator::Validate;

use super::dates::validate_date;
use super::error::{ApiError, ResultExt};
use super::extract::{ValidJson, ValidPath, ValidQuery};
use crate::auth::{AllowedRoles, Identity, role_guard};
use crate::db::{
    Database, NewTask, Role, Task, TaskFilter, TaskPriority, TaskStatus, TaskUpdate,
};

pub fn router(db: Database) -> Router {
    let manage_router = Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", delete(delete_task))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin, Role::Foreman]),
            role_guard,
        ))
        .with_state(db.clone());

    let update_router = Router::new()
        .route("/tasks/{id}", put(update_task))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin, Role::Foreman, Role::Worker]),
            role_guard,
        ))
        .with_state(db.clone());

    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}", get(get_task))
        .route("/projects/{id}/tasks", get(list_project_tasks))
        .with_state(db)
        .merge(manage_router)
        .merge(update_router)
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
struct ListQuery {
    project_id: Option<i64>,
    status: Option<TaskStatus>,
    assignee_staff_id: Option<i64>,
    assignee_contractor_id: Option<i64>,
}

#[derive(Deserialize)]
struct DeleteQuery {
    soft: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct CreateTaskRequest {
    project_id: i64,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    title: String,
    #[validate(length(max = 5000, message = "is too long"))]
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    assignee_staff_id: Option<i64>,
    assignee_contractor_id: Option<i64>,
    #[validate(custom(function = "validate_date"))]
    due_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    start_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    end_date: Option<String>,
    #[validate(length(max = 5000, message = "is too long"))]
    notes: Option<String>,
}

#[derive(Deserialize, Validate)]
struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "must not be empty"))]
    title: Option<String>,
    #[validate(length(max = 5000, message = "is too long"))]
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable")]
    assignee_staff_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    assignee_contractor_id: Option<Option<i64>>,
    #[validate(custom(function = "validate_date"))]
    due_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    start_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    end_date: Option<String>,
    #[validate(length(max = 5000, message = "is too long"))]
    notes: Option<String>,
}

/// Dates are ISO strings, so lexical order is calendar order.
fn check_date_order(start: Option<&str>, end: Option<&str>) -> Result<(), ApiError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(ApiError::bad_request("start_date: must not be after end_date"))
        }
        _ => Ok(()),
    }
}

/// Assignees must refer to an active staff member and an existing contractor.
async fn check_assignees(
    db: &Database,
    staff_id: Option<i64>,
    contractor_id: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(staff_id) = staff_id {
        db.users()
            .get_active(staff_id)
            .await
            .db_err("Failed to get staff member")?
            .ok_or_else(|| ApiError::bad_request("Staff member not found"))?;
    }
    if let Some(contractor_id) = contractor_id {
        db.contractors()
            .get(contractor_id)
            .await
            .db_err("Failed to get contractor")?
            .ok_or_else(|| ApiError::bad_request("Contractor not found"))?;
    }
    Ok(())
}

async fn load(db: &Database, id: i64) -> Result<Task, ApiError> {
    db.tasks()
        .get(id)
        .await
        .db_err("Failed to get task")?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

async fn list_tasks(
    State(db): State<Database>,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TaskFilter {
        project_id: query.project_id,
        status: query.status,
        assignee_staff_id: query.assignee_staff_id,
        assignee_contractor_id: query.assignee_contractor_id,
    };
    let tasks = db
        .tasks()
        .list(&filter)
        .await
        .db_err("Failed to list tasks")?;
    Ok(Json(tasks))
}

async fn list_project_tasks(
    State(db): State<Database>,
    ValidPath(project_id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    db.projects()
        .get(project_id)
        .await
        .db_err("Failed to get project")?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let tasks = db
        .tasks()
        .list(&TaskFilter {
            project_id: Some(project_id),
            ..Default::default()
        })
        .await
        .db_err("Failed to list tasks")?;
    Ok(Json(tasks))
}

async fn get_task(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load(&db, id).await?))
}

async fn create_task(
    State(db): State<Database>,
    identity: Identity,
    ValidJson(payload): ValidJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_date_order(payload.start_date.as_deref(), payload.end_date.as_deref())?;

    db.projects()
        .get(payload.project_id)
        .await
        .db_err("Failed to get project")?
        .ok_or_else(|| ApiError::bad_request("Project not found"))?;
    check_assignees(
        &db,
        payload.assignee_staff_id,
        payload.assignee_contractor_id,
    )
    .await?;

    let id = db
        .tasks()
        .create(&NewTask {
            project_id: payload.project_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            status: payload.status.unwrap_or(TaskStatus::Todo),
            priority: payload.priority.unwrap_or(TaskPriority::Medium),
            assignee_staff_id: payload.assignee_staff_id,
            assignee_contractor_id: payload.assignee_contractor_id,
            due_date: payload.due_date.as_deref(),
            start_date: payload.start_date.as_deref(),
            end_date: payload.end_date.as_deref(),
            notes: payload.notes.as_deref(),
        })
        .await
        .db_err("Failed to create task")?;

    info!(
        user_id = identity.id,
        task_id = id,
        project_id = payload.project_id,
        "Task created"
    );

    Ok((StatusCode::CREATED, Json(load(&db, id).await?)))
}

async fn update_task(
    State(db): State<Database>,
    identity: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = load(&db, id).await?;

    check_date_order(
        payload.start_date.as_deref().or(current.start_date.as_deref()),
        payload.end_date.as_deref().or(current.end_date.as_deref()),
    )?;
    check_assignees(
        &db,
        payload.assignee_staff_id.flatten(),
        payload.assignee_contractor_id.flatten(),
    )
    .await?;

    let update = TaskUpdate {
        title: payload.title.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        status: payload.status,
        priority: payload.priority,
        assignee_staff_id: payload.assignee_staff_id,
        assignee_contractor_id: payload.assignee_contractor_id,
        due_date: payload.due_date.as_deref(),
        start_date: payload.start_date.as_deref(),
        end_date: payload.end_date.as_deref(),
        notes: payload.notes.as_deref(),
    };
    let updated = db
        .tasks()
        .update(id, &update)
        .await
        .db_err("Failed to update task")?;
    if !updated {
        return Err(ApiError::not_found("Task not found"));
    }

    info!(user_id = identity.id, task_id = id, "Task updated");

    Ok(Json(load(&db, id).await?))
}

async fn delete_task(
    State(db): State<Database>,
    identity: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<DeleteQuery>,
) -> Result<Response, ApiError> {
    if query.soft.unwrap_or(true) {
        let completed = db
            .tasks()
            .complete(id)
            .await
            .db_err("Failed to complete task")?;
        if !completed {
            return Err(ApiError::not_found("Task not found"));
        }

        info!(user_id = identity.id, task_id = id, "Task marked done");
        return Ok(Json(load(&db, id).await?).into_response());
    }

    let deleted = db
        .tasks()
        .delete(id)
        .await
        .db_err("Failed to delete task")?;
    if !deleted {
        return Err(ApiError::not_found("Task not found"));
    }

    info!(user_id = identity.id, task_id = id, "Task deleted");

    Ok(Json(serde_json::json!({ "ok": true })).into_response())
}
