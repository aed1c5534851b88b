//! Field-level validation error shared by model, repository and service.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before or during persistence.
///
/// `field` names the request field the caller should fix; the HTTP layer
/// renders it as `{"errors": {field: [message]}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}

/// Trims `value` and checks it is non-empty and at most `max_chars` long.
pub(crate) fn normalize_required_text(
    field: &str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "this field may not be blank"));
    }
    ensure_max_chars(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

pub(crate) fn ensure_max_chars(
    field: &str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("ensure this field has no more than {max_chars} characters"),
        ));
    }
    Ok(())
}
