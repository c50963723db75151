//! Active-user directory, used by pickers that assign people to work.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use super::error::{ApiError, ResultExt};
use super::extract::{ValidPath, ValidQuery};
use crate::db::{Database, Role, StaffMember};

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .with_state(db)
}

#[derive(Deserialize)]
struct ListQuery {
    roles: Option<String>,
}

/// Parse a comma-separated role list. Blank entries are ignored.
fn parse_roles(raw: &str) -> Result<Vec<Role>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Role::parse(s).ok_or_else(|| ApiError::bad_request("Unknown role in filter")))
        .collect()
}

async fn list_users(
    State(db): State<Database>,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = match query.roles.as_deref() {
        Some(raw) => parse_roles(raw)?,
        None => Vec::new(),
    };

    let users = db
        .users()
        .list_active(&roles)
        .await
        .db_err("Failed to list users")?;

    Ok(Json(users))
}

async fn get_user(
    State(db): State<Database>,
    ValidPath(id): ValidPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = db
        .users()
        .get_active(id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(StaffMember::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!(
            parse_roles("foreman, labourer").unwrap(),
            vec![Role::Foreman, Role::Labourer]
        );
        assert!(parse_roles("").unwrap().is_empty());
        assert_eq!(parse_roles("foreman,,").unwrap(), vec![Role::Foreman]);
        assert!(parse_roles("foreman,boss").is_err());
    }
}
