use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::error::{ApiError, ResultExt, is_unique_violation};
use super::extract::{ValidJson, ValidPath};
use crate::auth::{AllowedRoles, Identity, role_guard};
use crate::db::{Database, ProjectStatus, Role};

pub fn router(db: Database) -> Router {
    let create_router = Router::new()
        .route("/projects", post(create_project))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin]),
            role_guard,
        ))
        .with_state(db.clone());

    let update_router = Router::new()
        .route("/projects/{id}", patch(update_project))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin, Role::Foreman]),
            role_guard,
        ))
        .with_state(db.clone());

    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{id}", get(get_project))
        .with_state(db)
        .merge(create_router)
        .merge(update_router)
}

#[derive(Deserialize, Validate)]
struct CreateProjectRequest {
    #[serde(rename = "ref")]
    #[validate(length(min = 1, max = 50, message = "is required"))]
    reference: String,
    #[validate(length(min = 1, max = 500, message = "is required"))]
    address: String,
    #[validate(length(max = 200, message = "is too long"))]
    client_name: Option<String>,
}

#[derive(Serialize)]
struct CreateProjectResponse {
    id: i64,
}

#[derive(Deserialize, Validate)]
struct UpdateProjectRequest {
    status: Option<ProjectStatus>,
    #[validate(length(max = 5000, message = "is too long"))]
    notes: Option<String>,
}

async fn list_projects(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let projects = db
        .projects()
        .list()
        .await
        .db_err("Failed to list projects")?;
    Ok(Json(projects))
}

async fn get_project(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = db
        .projects()
        .get(id)
        .await
        .db_err("Failed to get project")?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(Json(project))
}

async fn create_project(
    State(db): State<Database>,
    identity: Identity,
    ValidJson(payload): ValidJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = payload.reference.trim();

    let taken = db
        .projects()
        .is_ref_taken(reference)
        .await
        .db_err("Failed to check project reference")?;
    if taken {
        return Err(ApiError::conflict("Project reference already exists"));
    }

    let id = db
        .projects()
        .create(
            reference,
            payload.address.trim(),
            payload.client_name.as_deref(),
            identity.id,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Project reference already exists")
            } else {
                ApiError::db_error("Failed to create project", e)
            }
        })?;

    info!(user_id = identity.id, project_id = id, "Project created");

    Ok((StatusCode::CREATED, Json(CreateProjectResponse { id })))
}

async fn update_project(
    State(db): State<Database>,
    identity: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = db
        .projects()
        .update(id, payload.status, payload.notes.as_deref())
        .await
        .db_err("Failed to update project")?;
    if !updated {
        return Err(ApiError::not_found("Project not found"));
    }

    info!(user_id = identity.id, project_id = id, "Project updated");

    Ok(Json(serde_json::json!({ "ok": true })))
}
