//! Bearer-token authentication.
//!
//! Tokens are random, handed out once at registration, and stored only as
//! a SHA-256 hex digest. The middleware resolves the digest to a user and
//! inserts a [`Caller`] extension; handlers pass `caller.user_id` into
//! every core call.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use keepnote_core::{SqliteUserRepository, UserId, UserService};
use log::debug;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";
/// Longer headers are rejected before hashing.
const MAX_TOKEN_LENGTH: usize = 512;

/// Authenticated identity of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

/// Issues a fresh opaque token (two v4 UUIDs, 244 random bits).
pub fn issue_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get("authorization")?.to_str().ok()?;
    let token = header.strip_prefix(AUTHORIZATION_BEARER_PREFIX)?.trim();
    if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
        return None;
    }
    Some(token)
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(request.headers()) else {
        debug!("event=auth module=server status=rejected reason=missing_token");
        return Err(ApiError::Unauthorized);
    };
    let digest = hash_token(token);

    let user = state
        .with_db(move |conn| {
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            service.authenticate(&digest)
        })
        .await?;
    let Some(user) = user else {
        debug!("event=auth module=server status=rejected reason=unknown_token");
        return Err(ApiError::Unauthorized);
    };

    request.extensions_mut().insert(Caller { user_id: user.id });
    Ok(next.run(request).await)
}
