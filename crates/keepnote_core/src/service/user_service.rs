//! Account use-case service.
//!
//! Token issuance and hashing belong to the transport layer; this service
//! only ever sees digests.

use crate::model::user::{normalize_username, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn register(&self, username: &str, token_hash: &str) -> ServiceResult<User> {
        let username = normalize_username(username)?;
        let user = self.repo.create_user(&username, token_hash)?;
        info!("event=user_register module=service status=ok");
        Ok(user)
    }

    /// Resolves a token digest; `None` means the caller is unauthenticated.
    pub fn authenticate(&self, token_hash: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_by_token_hash(token_hash)?)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(id)?
            .ok_or(ServiceError::NotFound { entity: "user" })
    }

    /// Deletes the account with all notes, labels and checklist items.
    pub fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        self.repo.delete_user(id)?;
        info!("event=user_delete module=service status=ok");
        Ok(())
    }
}
