use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use adwell_db::models::UserRow;
use adwell_types::api::UpdateUserRequest;
use adwell_types::models::{Role, User};

use crate::auth::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let rows = state.db.list_users().map_err(|e| {
        error!("user listing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let users: Vec<User> = rows.into_iter().map(user_from_row).collect();
    Ok(Json(users))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = state
        .db
        .update_user(&id, req.name.as_deref(), req.phone.as_deref())
        .map_err(|e| {
            error!("user update failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(user_from_row(row)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let deleted = state.db.delete_user(&id).map_err(|e| {
        error!("user delete failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        email: row.email,
        name: row.name,
        phone: row.phone,
        role: Role::from_db(&row.role),
    }
}
