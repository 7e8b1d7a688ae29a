use std::sync::Arc;

use crate::db::{ LedgerRepository, user };
use crate::enums::Role;
use crate::error::Result;

use super::MAX_PAGE_SIZE;

pub struct UserService {
    repository: Arc<LedgerRepository>,
    admin_ids: Vec<i64>,
}

impl UserService {
    pub fn new(repository: Arc<LedgerRepository>, admin_ids: Vec<i64>) -> Self {
        Self { repository, admin_ids }
    }

    /// First-contact registration. Re-running it for a known user is a
    /// no-op that returns the existing row.
    pub async fn register(&self, external_id: i64, handle: Option<&str>) -> Result<user::Model> {
        self.repository.upsert_user(external_id, handle).await
    }

    pub async fn get(&self, external_id: i64) -> Result<user::Model> {
        self.repository.get_user(external_id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<user::Model> {
        self.repository.get_user_by_id(id).await
    }

    pub async fn find(&self, ident: &str) -> Result<user::Model> {
        self.repository.find_user(ident).await
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<user::Model>> {
        self.repository.list_users(limit.min(MAX_PAGE_SIZE), offset).await
    }

    pub async fn set_role(&self, ident: &str, role: Role, actor: &str) -> Result<user::Model> {
        let user = self.repository.find_user(ident).await?;
        self.repository.set_role(user.id, role, actor).await
    }

    /// Staff check used by the bot. The env allowlist grants access even
    /// without a stored row; otherwise the stored role decides.
    pub async fn is_admin(&self, external_id: i64) -> bool {
        if self.admin_ids.contains(&external_id) {
            return true;
        }

        match self.repository.get_user(external_id).await {
            Ok(user) =>
                user.role
                    .parse::<Role>()
                    .map(|role| role.is_staff())
                    .unwrap_or(false),
            Err(_) => false,
        }
    }
}
