use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use super::error::{ApiError, ResultExt};
use crate::auth::Identity;
use crate::db::Database;

pub fn router(db: Database) -> Router {
    Router::new().route("/me", get(me)).with_state(db)
}

/// Current user, re-read from the store so profile changes show up before
/// the access token expires.
async fn me(
    State(db): State<Database>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let user = db
        .users()
        .get_by_id(identity.id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(user.profile()))
}
