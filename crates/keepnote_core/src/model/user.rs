//! Note owner identity.

use crate::model::validation::{normalize_required_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

const USERNAME_MAX_CHARS: usize = 150;

/// Registered account. Credentials are stored as a token digest only and
/// never leave the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Trims and length-checks a username.
pub fn normalize_username(value: &str) -> Result<String, ValidationError> {
    normalize_required_text("username", value, USERNAME_MAX_CHARS)
}
