use std::sync::Arc;

use crate::db::{ LedgerRepository, audit_log };
use crate::enums::AuditAction;
use crate::error::Result;

use super::MAX_PAGE_SIZE;

pub struct AuditService {
    repository: Arc<LedgerRepository>,
}

impl AuditService {
    pub fn new(repository: Arc<LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Newest entries first, optionally narrowed to one actor or one
    /// action kind.
    pub async fn list(
        &self,
        limit: u64,
        actor: Option<&str>,
        action: Option<AuditAction>
    ) -> Result<Vec<audit_log::Model>> {
        self.repository.list_audit(limit.min(MAX_PAGE_SIZE), actor, action).await
    }
}
