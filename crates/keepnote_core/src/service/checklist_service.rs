//! Checklist item use-case service.
//!
//! Item-level edits (checking a box, renaming one row) go through here
//! rather than through a full note update.

use crate::model::checklist::{ChecklistItem, ChecklistItemId, ChecklistItemInput};
use crate::model::note::NoteId;
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use crate::repo::checklist_repo::ChecklistRepository;
use crate::repo::page::{Page, PageRequest};
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct ChecklistService<R: ChecklistRepository> {
    repo: R,
}

impl<R: ChecklistRepository> ChecklistService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an item; `input.note` is required and must be the caller's.
    pub fn create_item(
        &mut self,
        owner: UserId,
        input: &ChecklistItemInput,
    ) -> ServiceResult<ChecklistItem> {
        let note_id = input
            .note
            .ok_or_else(|| ValidationError::new("note", "this field is required"))?;
        let item = self.repo.create_item(owner, note_id, input)?;
        info!("event=checklist_item_create module=service status=ok");
        Ok(item)
    }

    pub fn get_item(&self, owner: UserId, id: ChecklistItemId) -> ServiceResult<ChecklistItem> {
        self.repo
            .get_item(owner, id)?
            .ok_or(ServiceError::NotFound {
                entity: "checklist item",
            })
    }

    pub fn list_items(
        &self,
        owner: UserId,
        note_id: Option<NoteId>,
        page: PageRequest,
    ) -> ServiceResult<Page<ChecklistItem>> {
        let page = self.repo.list_items(owner, note_id, page)?;
        if page.is_out_of_range() {
            return Err(ServiceError::PageOutOfRange(page.page));
        }
        Ok(page)
    }

    pub fn update_item(
        &mut self,
        owner: UserId,
        id: ChecklistItemId,
        input: &ChecklistItemInput,
    ) -> ServiceResult<ChecklistItem> {
        let item = self.repo.update_item(owner, id, input)?;
        info!("event=checklist_item_update module=service status=ok");
        Ok(item)
    }

    pub fn delete_item(&self, owner: UserId, id: ChecklistItemId) -> ServiceResult<()> {
        self.repo.delete_item(owner, id)?;
        info!("event=checklist_item_delete module=service status=ok");
        Ok(())
    }
}
