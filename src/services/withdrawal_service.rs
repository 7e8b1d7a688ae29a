use std::sync::Arc;

use crate::db::{ LedgerRepository, user, withdrawal };
use crate::enums::WithdrawalStatus;
use crate::error::{ AppError, Result };

use super::MAX_PAGE_SIZE;

pub const MAX_DESTINATION_LEN: usize = 256;

pub const DEFAULT_NETWORK: &str = "USDT";

pub struct WithdrawalService {
    repository: Arc<LedgerRepository>,
}

impl WithdrawalService {
    pub fn new(repository: Arc<LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Validates the request, registers the user on first contact, then
    /// reserves the money and files the request in one transaction.
    /// Returns the new request together with the debited user row.
    pub async fn request(
        &self,
        external_id: i64,
        handle: Option<&str>,
        amount_cents: i64,
        destination: &str,
        network: &str,
        actor: &str
    ) -> Result<(withdrawal::Model, user::Model)> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidInput("Amount must be positive".to_string()));
        }

        let destination = destination.trim();
        if destination.is_empty() {
            return Err(AppError::InvalidInput("Destination address is required".to_string()));
        }
        if destination.len() > MAX_DESTINATION_LEN {
            return Err(AppError::InvalidInput(format!(
                "Destination is longer than {} characters",
                MAX_DESTINATION_LEN
            )));
        }

        let user = self.repository.upsert_user(external_id, handle).await?;
        self.repository.request_withdrawal(user.id, amount_cents, destination, network, actor).await
    }

    pub async fn approve(&self, id: i64, actor: &str, txid: Option<&str>) -> Result<withdrawal::Model> {
        self.repository.decide_withdrawal(id, WithdrawalStatus::Approved, actor, txid, None).await
    }

    /// Denial refunds the reserved amount in the same transaction that
    /// flips the status.
    pub async fn deny(&self, id: i64, actor: &str, note: Option<&str>) -> Result<withdrawal::Model> {
        self.repository.decide_withdrawal(id, WithdrawalStatus::Denied, actor, None, note).await
    }

    pub async fn get(&self, id: i64) -> Result<withdrawal::Model> {
        self.repository.get_withdrawal(id).await
    }

    /// Pending queue in arrival order, joined with the requesting users.
    pub async fn queue(
        &self,
        limit: u64
    ) -> Result<Vec<(withdrawal::Model, Option<user::Model>)>> {
        self.repository.list_pending_with_users(limit.min(MAX_PAGE_SIZE)).await
    }

    pub async fn list(
        &self,
        status: Option<WithdrawalStatus>,
        limit: u64,
        offset: u64
    ) -> Result<Vec<withdrawal::Model>> {
        self.repository.list_withdrawals(status, limit.min(MAX_PAGE_SIZE), offset).await
    }

    pub async fn history_for(&self, external_id: i64, limit: u64) -> Result<Vec<withdrawal::Model>> {
        let user = self.repository.get_user(external_id).await?;
        self.repository.list_withdrawals_for_user(user.id, limit.min(MAX_PAGE_SIZE)).await
    }
}
