//! Core domain logic for KeepNote.
//! This crate is the single source of truth for note ownership, lifecycle
//! flags, ordering and checklist invariants. Transports stay thin.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingSettings};
pub use model::checklist::{ChecklistItem, ChecklistItemId, ChecklistItemInput};
pub use model::datetime::{from_epoch_ms, now_ms, parse_reminder};
pub use model::label::{Label, LabelId};
pub use model::note::{
    FlagRequest, FlagToggle, Note, NoteColor, NoteDraft, NoteFlags, NoteId, NotePatch,
};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use repo::checklist_repo::{ChecklistRepository, SqliteChecklistRepository};
pub use repo::label_repo::{LabelRepository, SqliteLabelRepository};
pub use repo::note_query::{NoteListQuery, NoteOrdering};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::page::{Page, PageRequest};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::checklist_service::ChecklistService;
pub use service::label_service::LabelService;
pub use service::note_service::{NoteService, ReorderOutcome};
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
