//! Note use-case service.
//!
//! # Responsibility
//! - Create, update, read, list and delete notes for one caller.
//! - Run the lifecycle toggles (pin/archive/trash) and empty-trash.
//! - Run drag-and-drop reorders.
//!
//! # Invariants
//! - A toggle that fails leaves every flag untouched.
//! - Reorder never reports foreign or unknown ids; they are dropped.
//! - Write paths read the note back so callers see persisted state.

use crate::model::note::{FlagToggle, Note, NoteDraft, NoteFlags, NoteId, NotePatch};
use crate::model::ordering::ReorderPlan;
use crate::model::user::UserId;
use crate::repo::note_query::NoteListQuery;
use crate::repo::note_repo::NoteRepository;
use crate::repo::page::Page;
use crate::service::{ServiceError, ServiceResult};
use log::{debug, info, warn};
use std::time::Instant;

/// Outcome of a reorder request, kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Distinct ids after last-occurrence-wins deduplication.
    pub requested: usize,
    /// Notes of the caller that actually moved.
    pub applied: usize,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_note(&mut self, owner: UserId, draft: NoteDraft) -> ServiceResult<Note> {
        let started_at = Instant::now();
        let note_id = self.repo.create_note(owner, &draft).map_err(|err| {
            let err = ServiceError::from(err);
            warn!(
                "event=note_create module=service status=error error_code={} duration_ms={}",
                err.code(),
                started_at.elapsed().as_millis()
            );
            err
        })?;

        info!(
            "event=note_create module=service status=ok items={} labels={} duration_ms={}",
            draft.checklist_items.len(),
            draft.label_ids.len(),
            started_at.elapsed().as_millis()
        );
        self.read_back(owner, note_id, "created note not found in read-back")
    }

    /// Applies a partial update. PUT and PATCH share these semantics.
    pub fn update_note(
        &mut self,
        owner: UserId,
        id: NoteId,
        patch: NotePatch,
    ) -> ServiceResult<Note> {
        let started_at = Instant::now();
        self.repo.update_note(owner, id, &patch).map_err(|err| {
            let err = ServiceError::from(err);
            warn!(
                "event=note_update module=service status=error error_code={} duration_ms={}",
                err.code(),
                started_at.elapsed().as_millis()
            );
            err
        })?;

        info!(
            "event=note_update module=service status=ok reconciled_items={} duration_ms={}",
            patch.checklist_items.is_some(),
            started_at.elapsed().as_millis()
        );
        self.read_back(owner, id, "updated note not found in read-back")
    }

    pub fn get_note(&self, owner: UserId, id: NoteId) -> ServiceResult<Note> {
        self.repo
            .get_note(owner, id)?
            .ok_or(ServiceError::NotFound { entity: "note" })
    }

    pub fn list_notes(&self, owner: UserId, query: &NoteListQuery) -> ServiceResult<Page<Note>> {
        let page = self.repo.list_notes(owner, query)?;
        if page.is_out_of_range() {
            return Err(ServiceError::PageOutOfRange(page.page));
        }
        debug!(
            "event=note_list module=service status=ok count={} page={} page_size={}",
            page.count, page.page, page.page_size
        );
        Ok(page)
    }

    pub fn delete_note(&self, owner: UserId, id: NoteId) -> ServiceResult<()> {
        self.repo.delete_note(owner, id)?;
        info!("event=note_delete module=service status=ok");
        Ok(())
    }

    pub fn toggle_pin(&mut self, owner: UserId, id: NoteId) -> ServiceResult<NoteFlags> {
        self.toggle(owner, id, FlagToggle::Pin)
    }

    pub fn toggle_archive(&mut self, owner: UserId, id: NoteId) -> ServiceResult<NoteFlags> {
        self.toggle(owner, id, FlagToggle::Archive)
    }

    pub fn toggle_trash(&mut self, owner: UserId, id: NoteId) -> ServiceResult<NoteFlags> {
        self.toggle(owner, id, FlagToggle::Trash)
    }

    /// Flips one flag with its side effects in a single locked write.
    pub fn toggle(
        &mut self,
        owner: UserId,
        id: NoteId,
        toggle: FlagToggle,
    ) -> ServiceResult<NoteFlags> {
        let started_at = Instant::now();
        match self.repo.toggle_flag(owner, id, toggle) {
            Ok(flags) => {
                info!(
                    "event=note_toggle module=service status=ok action={} pinned={} archived={} trashed={} duration_ms={}",
                    toggle.as_str(),
                    flags.is_pinned,
                    flags.is_archived,
                    flags.is_trashed,
                    started_at.elapsed().as_millis()
                );
                Ok(flags)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    "event=note_toggle module=service status=error action={} error_code={} duration_ms={}",
                    toggle.as_str(),
                    err.code(),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Permanently deletes every trashed note of the caller.
    pub fn empty_trash(&self, owner: UserId) -> ServiceResult<u64> {
        let deleted = self.repo.empty_trash(owner)?;
        info!("event=note_empty_trash module=service status=ok deleted={deleted}");
        Ok(deleted)
    }

    /// Rewrites `order`/`is_pinned` from the two visual partitions.
    ///
    /// Ids that do not name one of the caller's notes are ignored without
    /// error; the outcome is never exposed beyond logs.
    pub fn reorder(
        &mut self,
        owner: UserId,
        pinned_ids: &[NoteId],
        other_ids: &[NoteId],
    ) -> ServiceResult<ReorderOutcome> {
        let started_at = Instant::now();
        let plan = ReorderPlan::from_lists(pinned_ids, other_ids);
        let applied = self.repo.reorder(owner, &plan)?;
        let outcome = ReorderOutcome {
            requested: plan.placements().len(),
            applied,
        };

        if outcome.applied < outcome.requested {
            debug!(
                "event=note_reorder module=service status=partial ignored={}",
                outcome.requested - outcome.applied
            );
        }
        info!(
            "event=note_reorder module=service status=ok requested={} applied={} duration_ms={}",
            outcome.requested,
            outcome.applied,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn read_back(&self, owner: UserId, id: NoteId, details: &'static str) -> ServiceResult<Note> {
        self.repo
            .get_note(owner, id)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
