//! Core use-case services.
//!
//! # Responsibility
//! - Validate input and orchestrate repository calls per use-case.
//! - Collapse repository failures into the caller-facing taxonomy.
//! - Emit metadata-only diagnostic events.
//!
//! # Invariants
//! - Every operation takes the caller's `UserId` explicitly.
//! - Ownership failures surface as `NotFound`, never as a distinct error.
//! - Nothing here retries a failed write.

use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod checklist_service;
pub mod label_service;
pub mod note_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error taxonomy shared by every service.
#[derive(Debug)]
pub enum ServiceError {
    /// Record is absent or owned by another user; the two are never told
    /// apart.
    NotFound { entity: &'static str },
    /// Malformed input, duplicate label name or cross-owner reference.
    Validation(ValidationError),
    /// Requested page lies past the last page.
    PageOutOfRange(u32),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Short machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::PageOutOfRange(_) => "page_out_of_range",
            Self::Repo(_) => "repo_failure",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity } => write!(f, "{entity} not found"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::PageOutOfRange(page) => write!(f, "invalid page: {page}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, .. } => Self::NotFound { entity },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
