//! Label model.
//!
//! # Invariants
//! - `(owner_user_id, name)` is unique; enforced by storage and surfaced as
//!   a validation failure on `name`.
//! - Deleting a label removes it from every note, never the notes.

use crate::model::user::UserId;
use crate::model::validation::{normalize_required_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LabelId = Uuid;

const LABEL_NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub owner_user_id: UserId,
    pub name: String,
}

impl Label {
    pub fn new(owner_user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            name: name.into(),
        }
    }
}

/// Trims a label name and enforces the length contract.
///
/// Case is preserved: `Work` and `work` are distinct labels.
pub fn normalize_label_name(value: &str) -> Result<String, ValidationError> {
    normalize_required_text("name", value, LABEL_NAME_MAX_CHARS)
}

/// Validation failure reported when an owner already has a label `name`.
pub fn duplicate_label_name(name: &str) -> ValidationError {
    ValidationError::new("name", format!("label `{name}` already exists"))
}
