//! Subcontractor directory.
//!
//! Anyone signed in can read it. Admins and foremen maintain it; only admins delete.

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

use super::dates::validate_date;
use super::error::{ApiError, ResultExt, is_unique_violation};
use super::extract::{ValidJson, ValidPath};
use crate::auth::{AllowedRoles, Identity, role_guard};
use crate::db::{Contractor, ContractorStatus, Database, NewContractor, Role};

const DUPLICATE: &str = "Contractor with this company and contact person already exists";

pub fn router(db: Database) -> Router {
    let write_router = Router::new()
        .route("/contractors", post(create_contractor))
        .route("/contractors/{id}", put(update_contractor))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin, Role::Foreman]),
            role_guard,
        ))
        .with_state(db.clone());

    let delete_router = Router::new()
        .route("/contractors/{id}", delete(delete_contractor))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin]),
            role_guard,
        ))
        .with_state(db.clone());

    Router::new()
        .route("/contractors", get(list_contractors))
        .route("/contractors/{id}", get(get_contractor))
        .with_state(db)
        .merge(write_router)
        .merge(delete_router)
}

#[derive(Deserialize, Validate)]
struct CreateContractorRequest {
    #[validate(length(min = 1, max = 200, message = "is required"))]
    company: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    trade: String,
    #[serde(alias = "contactName")]
    #[validate(length(min = 1, max = 200, message = "is required"))]
    contact_name: String,
    #[validate(length(min = 1, max = 50, message = "is required"))]
    phone: String,
    #[validate(email(message = "must be a valid email address"))]
    email: String,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    rating: Option<i64>,
    #[serde(alias = "insuranceExpiry")]
    #[validate(custom(function = "validate_date"))]
    insurance_expiry: Option<String>,
    #[validate(length(max = 5000, message = "is too long"))]
    notes: Option<String>,
    status: Option<ContractorStatus>,
}

#[derive(Deserialize, Validate)]
struct UpdateContractorRequest {
    #[validate(length(min = 1, max = 200, message = "must not be empty"))]
    company: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must not be empty"))]
    trade: Option<String>,
    #[serde(alias = "contactName")]
    #[validate(length(min = 1, max = 200, message = "must not be empty"))]
    contact_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must not be empty"))]
    phone: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    email: Option<String>,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    rating: Option<i64>,
    #[serde(alias = "insuranceExpiry")]
    #[validate(custom(function = "validate_date"))]
    insurance_expiry: Option<String>,
    #[validate(length(max = 5000, message = "is too long"))]
    notes: Option<String>,
    status: Option<ContractorStatus>,
}

fn write_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |e| {
        if is_unique_violation(&e) {
            ApiError::conflict(DUPLICATE)
        } else {
            ApiError::db_error(context, e)
        }
    }
}

async fn load(db: &Database, id: i64) -> Result<Contractor, ApiError> {
    db.contractors()
        .get(id)
        .await
        .db_err("Failed to get contractor")?
        .ok_or_else(|| ApiError::not_found("Contractor not found"))
}

async fn list_contractors(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let contractors = db
        .contractors()
        .list()
        .await
        .db_err("Failed to list contractors")?;
    Ok(Json(contractors))
}

async fn get_contractor(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load(&db, id).await?))
}

async fn create_contractor(
    State(db): State<Database>,
    identity: Identity,
    ValidJson(payload): ValidJson<CreateContractorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = db
        .contractors()
        .create(&NewContractor {
            company: payload.company.trim(),
            trade: payload.trade.trim(),
            contact_name: payload.contact_name.trim(),
            phone: payload.phone.trim(),
            email: payload.email.trim(),
            rating: payload.rating,
            insurance_expiry: payload.insurance_expiry.as_deref(),
            notes: payload.notes.as_deref(),
            status: payload.status.unwrap_or(ContractorStatus::Active),
        })
        .await
        .map_err(write_error("Failed to create contractor"))?;

    info!(user_id = identity.id, contractor_id = id, "Contractor created");

    Ok((StatusCode::CREATED, Json(load(&db, id).await?)))
}

async fn update_contractor(
    State(db): State<Database>,
    identity: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdateContractorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = load(&db, id).await?;

    let merged = NewContractor {
        company: payload.company.as_deref().map_or(current.company.as_str(), str::trim),
        trade: payload.trade.as_deref().map_or(current.trade.as_str(), str::trim),
        contact_name: payload
            .contact_name
            .as_deref()
            .map_or(current.contact_name.as_str(), str::trim),
        phone: payload.phone.as_deref().map_or(current.phone.as_str(), str::trim),
        email: payload.email.as_deref().map_or(current.email.as_str(), str::trim),
        rating: payload.rating.or(current.rating),
        insurance_expiry: payload
            .insurance_expiry
            .as_deref()
            .or(current.insurance_expiry.as_deref()),
        notes: payload.notes.as_deref().or(current.notes.as_deref()),
        status: payload.status.unwrap_or(current.status),
    };

    let updated = db
        .contractors()
        .update(id, &merged)
        .await
        .map_err(write_error("Failed to update contractor"))?;
    if !updated {
        return Err(ApiError::not_found("Contractor not found"));
    }

    info!(user_id = identity.id, contractor_id = id, "Contractor updated");

    Ok(Json(load(&db, id).await?))
}

async fn delete_contractor(
    State(db): State<Database>,
    admin: Identity,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = db
        .contractors()
        .delete(id)
        .await
        .db_err("Failed to delete contractor")?;
    if !deleted {
        return Err(ApiError::not_found("Contractor not found"));
    }

    info!(admin_id = admin.id, contractor_id = id, "Contractor deleted");

    Ok(Json(serde_json::json!({ "ok": true })))
}
