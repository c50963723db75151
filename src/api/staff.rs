//! Staff management.
//!
//! Reads are open to any signed-in user; writes require the admin role.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::error::{ApiError, ResultExt, is_unique_violation};
use super::extract::{ValidJson, ValidPath};
use crate::auth::{AllowedRoles, Identity, role_guard};
use crate::db::{Database, NewUser, Role, StaffMember, UserStatus};
use crate::password::hash_password;

pub fn router(db: Database) -> Router {
    let admin_router = Router::new()
        .route("/staff", post(create_staff))
        .route("/staff/{id}", put(update_staff).delete(delete_staff))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles(&[Role::Admin]),
            role_guard,
        ))
        .with_state(db.clone());

    Router::new()
        .route("/staff", get(list_staff))
        .route("/staff/{id}", get(get_staff))
        .with_state(db)
        .merge(admin_router)
}

#[derive(Deserialize, Validate)]
struct CreateStaffRequest {
    #[validate(length(min = 1, max = 200, message = "is required"))]
    name: String,
    #[validate(email(message = "must be a valid email address"))]
    email: String,
    role: Role,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    position: String,
    #[validate(length(max = 50, message = "is too long"))]
    phone: Option<String>,
    #[validate(length(min = 8, max = 1024, message = "must be at least 8 characters"))]
    password: String,
}

#[derive(Deserialize, Validate)]
struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 200, message = "must not be empty"))]
    name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    email: Option<String>,
    #[validate(length(max = 50, message = "is too long"))]
    phone: Option<String>,
    role: Option<Role>,
    #[validate(length(max = 200, message = "is too long"))]
    position: Option<String>,
    status: Option<UserStatus>,
}

async fn list_staff(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let staff = db.users().list_all().await.db_err("Failed to list staff")?;
    Ok(Json(staff))
}

async fn get_staff(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get staff member")?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    Ok(Json(StaffMember::from(user)))
}

async fn create_staff(
    State(db): State<Database>,
    admin: Identity,
    ValidJson(payload): ValidJson<CreateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let taken = db
        .users()
        .is_email_taken(&payload.email, None)
        .await
        .db_err("Failed to check email")?;
    if taken {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = hash_password(payload.password)
        .await
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let id = db
        .users()
        .create(&NewUser {
            name: payload.name.trim(),
            email: &payload.email,
            phone: payload.phone.as_deref(),
            role: payload.role,
            position: Some(payload.position.trim()),
            password_hash: &password_hash,
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Email already exists")
            } else {
                ApiError::db_error("Failed to create staff member", e)
            }
        })?;

    let user = db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get staff member")?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    info!(
        admin_id = admin.id,
        user_id = id,
        role = user.role.as_str(),
        "Staff member created"
    );

    Ok((StatusCode::CREATED, Json(StaffMember::from(user))))
}

async fn update_staff(
    State(db): State<Database>,
    admin: Identity,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get staff member")?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    if let Some(email) = &payload.email {
        let taken = db
            .users()
            .is_email_taken(email, Some(id))
            .await
            .db_err("Failed to check email")?;
        if taken {
            return Err(ApiError::conflict("Email already exists"));
        }
        user.email = email.clone();
    }
    if let Some(name) = payload.name {
        user.name = name.trim().to_string();
    }
    if let Some(phone) = payload.phone {
        user.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }
    if let Some(role) = payload.role {
        if user.role == Role::Admin && role != Role::Admin {
            return Err(ApiError::bad_request("Cannot change the role of an admin user"));
        }
        user.role = role;
    }
    if let Some(position) = payload.position {
        user.position = Some(position).filter(|p| !p.trim().is_empty());
    }

    let was_active = user.is_active();
    if let Some(status) = payload.status {
        user.status = status;
    }

    // At least one active admin must remain to manage staff.
    if was_active && !user.is_active() && user.role == Role::Admin {
        let others = db
            .users()
            .count_active_admins_except(id)
            .await
            .db_err("Failed to count admins")?;
        if others == 0 {
            return Err(ApiError::bad_request("Cannot disable the last active admin"));
        }
    }

    db.users().update(&user).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Email already exists")
        } else {
            ApiError::db_error("Failed to update staff member", e)
        }
    })?;

    if was_active && !user.is_active() {
        let sessions = db
            .tokens()
            .revoke_all_for_user(id)
            .await
            .db_err("Failed to revoke sessions")?;
        info!(admin_id = admin.id, user_id = id, sessions, "Staff member disabled");
    }

    let user = db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get staff member")?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    Ok(Json(StaffMember::from(user)))
}

async fn delete_staff(
    State(db): State<Database>,
    admin: Identity,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get staff member")?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    if user.role == Role::Admin {
        return Err(ApiError::bad_request("Cannot delete admin users"));
    }

    db.users()
        .delete(id)
        .await
        .db_err("Failed to delete staff member")?;

    info!(admin_id = admin.id, user_id = id, "Staff member deleted");

    Ok(Json(serde_json::json!({ "ok": true })))
}
