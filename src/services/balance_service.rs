use std::sync::Arc;

use crate::db::{ LedgerRepository, user };
use crate::enums::AuditAction;
use crate::error::{ AppError, Result };

pub struct BalanceService {
    repository: Arc<LedgerRepository>,
}

impl BalanceService {
    pub fn new(repository: Arc<LedgerRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, ident: &str) -> Result<user::Model> {
        self.repository.find_user(ident).await
    }

    /// Self-service top-up from the bot. Registers the user on first
    /// contact and credits immediately.
    pub async fn deposit(
        &self,
        external_id: i64,
        handle: Option<&str>,
        amount_cents: i64
    ) -> Result<user::Model> {
        require_positive(amount_cents)?;

        let user = self.repository.upsert_user(external_id, handle).await?;
        self.repository.adjust_balance(
            user.id,
            amount_cents,
            &format!("tg:{}", external_id),
            AuditAction::BalanceAdd
        ).await
    }

    pub async fn set(&self, ident: &str, amount_cents: i64, actor: &str) -> Result<user::Model> {
        if amount_cents < 0 {
            return Err(AppError::InvalidInput("Balance cannot be negative".to_string()));
        }

        let user = self.repository.find_user(ident).await?;
        self.repository.set_balance(user.id, amount_cents, actor).await
    }

    pub async fn add(&self, ident: &str, amount_cents: i64, actor: &str) -> Result<user::Model> {
        require_positive(amount_cents)?;

        let user = self.repository.find_user(ident).await?;
        self.repository.adjust_balance(user.id, amount_cents, actor, AuditAction::BalanceAdd).await
    }

    pub async fn sub(&self, ident: &str, amount_cents: i64, actor: &str) -> Result<user::Model> {
        require_positive(amount_cents)?;

        let user = self.repository.find_user(ident).await?;
        self.repository.adjust_balance(user.id, -amount_cents, actor, AuditAction::BalanceSub).await
    }
}

fn require_positive(amount_cents: i64) -> Result<()> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidInput("Amount must be positive".to_string()));
    }
    Ok(())
}
