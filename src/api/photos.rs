//! Site photo records, tagged by stage of work.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::error::{ApiError, ResultExt};
use super::extract::{ValidJson, ValidPath, ValidQuery};
use crate::auth::{AllowedRoles, Identity, role_guard};
use crate::db::{Database, NewPhoto, Photo, PhotoFilter, PhotoTag, Role};

pub fn router(db: Database) -> Router {
    let write_router = Router::new()
        .route("/photos", post(create_photo))
        .route("/photos/{id}", put(update_photo))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin, Role::Foreman]),
            role_guard,
        ))
        .with_state(db.clone());

    let delete_router = Router::new()
        .route("/photos/{id}", delete(delete_photo))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin]),
            role_guard,
        ))
        .with_state(db.clone());

    Router::new()
        .route("/photos", get(list_photos))
        .route("/photos/{id}", get(get_photo))
        .with_state(db)
        .merge(write_router)
        .merge(delete_router)
}

#[derive(Deserialize)]
struct ListQuery {
    project_id: Option<i64>,
    tag: Option<PhotoTag>,
}

#[derive(Deserialize, Validate)]
struct CreatePhotoRequest {
    #[serde(alias = "projectId")]
    project_id: i64,
    #[validate(length(max = 500, message = "is too long"))]
    caption: Option<String>,
    tag: Option<PhotoTag>,
}

#[derive(Deserialize, Validate)]
struct UpdatePhotoRequest {
    #[validate(length(max = 500, message = "is too long"))]
    caption: Option<String>,
    tag: Option<PhotoTag>,
}

async fn load(db: &Database, id: i64) -> Result<Photo, ApiError> {
    db.photos()
        .get(id)
        .await
        .db_err("Failed to get photo")?
        .ok_or_else(|| ApiError::not_found("Photo not found"))
}

async fn list_photos(
    State(db): State<Database>,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let photos = db
        .photos()
        .list(&PhotoFilter {
            project_id: query.project_id,
            tag: query.tag,
        })
        .await
        .db_err("Failed to list photos")?;
    Ok(Json(photos))
}

async fn get_photo(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load(&db, id).await?))
}

async fn create_photo(
    State(db): State<Database>,
    identity: Identity,
    ValidJson(payload): ValidJson<CreatePhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    db.projects()
        .get(payload.project_id)
        .await
        .db_err("Failed to get project")?
        .ok_or_else(|| ApiError::bad_request("Project not found"))?;

    let id = db
        .photos()
        .create(&NewPhoto {
            project_id: payload.project_id,
            caption: payload.caption.as_deref(),
            tag: payload.tag.unwrap_or(PhotoTag::During),
            uploaded_by: identity.id,
        })
        .await
        .db_err("Failed to create photo")?;

    info!(
        user_id = identity.id,
        photo_id = id,
        project_id = payload.project_id,
        "Photo recorded"
    );

    Ok((StatusCode::CREATED, Json(load(&db, id).await?)))
}

async fn update_photo(
    State(db): State<Database>,
    identity: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdatePhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = db
        .photos()
        .update(id, payload.caption.as_deref(), payload.tag)
        .await
        .db_err("Failed to update photo")?;
    if !updated {
        return Err(ApiError::not_found("Photo not found"));
    }

    info!(user_id = identity.id, photo_id = id, "Photo updated");

    Ok(Json(load(&db, id).await?))
}

async fn delete_photo(
    State(db): State<Database>,
    admin: Identity,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = db
        .photos()
        .delete(id)
        .await
        .db_err("Failed to delete photo")?;
    if !deleted {
        return Err(ApiError::not_found("Photo not found"));
    }

    info!(admin_id = admin.id, photo_id = id, "Photo deleted");

    Ok(Json(serde_json::json!({ "ok": true })))
}
