//! Label use-case service.

use crate::model::label::{normalize_label_name, Label, LabelId};
use crate::model::user::UserId;
use crate::repo::label_repo::LabelRepository;
use crate::repo::page::{Page, PageRequest};
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct LabelService<R: LabelRepository> {
    repo: R,
}

impl<R: LabelRepository> LabelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a label; a name the caller already uses is rejected on `name`.
    pub fn create_label(&self, owner: UserId, name: &str) -> ServiceResult<Label> {
        let name = normalize_label_name(name)?;
        let label = self.repo.create_label(owner, &name)?;
        info!("event=label_create module=service status=ok");
        Ok(label)
    }

    pub fn get_label(&self, owner: UserId, id: LabelId) -> ServiceResult<Label> {
        self.repo
            .get_label(owner, id)?
            .ok_or(ServiceError::NotFound { entity: "label" })
    }

    pub fn list_labels(&self, owner: UserId, page: PageRequest) -> ServiceResult<Page<Label>> {
        let page = self.repo.list_labels(owner, page)?;
        if page.is_out_of_range() {
            return Err(ServiceError::PageOutOfRange(page.page));
        }
        Ok(page)
    }

    pub fn rename_label(&self, owner: UserId, id: LabelId, name: &str) -> ServiceResult<Label> {
        let name = normalize_label_name(name)?;
        let label = self.repo.rename_label(owner, id, &name)?;
        info!("event=label_rename module=service status=ok");
        Ok(label)
    }

    /// Deletes a label and detaches it from every note.
    pub fn delete_label(&self, owner: UserId, id: LabelId) -> ServiceResult<()> {
        self.repo.delete_label(owner, id)?;
        info!("event=label_delete module=service status=ok");
        Ok(())
    }
}
