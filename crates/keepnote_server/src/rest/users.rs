//! Registration and current-account endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use keepnote_core::{ServiceResult, SqliteUserRepository, User, UserService};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::json_body;
use crate::auth::{hash_token, issue_token, Caller};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

/// Registration result; the only response that ever carries the token.
#[derive(Debug, Serialize)]
pub struct RegisteredUserResponse {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

fn user_service(conn: &Connection) -> ServiceResult<UserService<SqliteUserRepository<'_>>> {
    Ok(UserService::new(SqliteUserRepository::try_new(conn)?))
}

/// POST /api/v1/users
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUserResponse>), ApiError> {
    let username = json_body(payload)?
        .username
        .ok_or_else(|| ApiError::validation("username", "this field is required"))?;
    let token = issue_token();
    let digest = hash_token(&token);

    let user = state
        .with_db(move |conn| user_service(conn)?.register(&username, &digest))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUserResponse {
            id: user.id,
            username: user.username,
            token,
        }),
    ))
}

/// GET /api/v1/users/me
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .with_db(move |conn| user_service(conn)?.get_user(caller.user_id))
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/me
pub async fn delete_current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    state
        .with_db(move |conn| user_service(conn)?.delete_user(caller.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
