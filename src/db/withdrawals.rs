use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    Set,
    TransactionTrait,
};
use serde_json::json;

use crate::enums::{ AuditAction, AuditEntity, WithdrawalStatus };
use crate::error::{ AppError, Result };

use super::{ LedgerRepository, User, Withdrawal, user, withdrawal };

impl LedgerRepository {
    /// Creates a pending withdrawal and debits the user in the same
    /// transaction, so reserved money is out of the balance the moment
    /// the request exists. Fails with InsufficientFunds (and writes
    /// nothing) when the balance does not cover the amount.
    pub async fn request_withdrawal(
        &self,
        user_id: i64,
        amount_cents: i64,
        destination: &str,
        network: &str,
        actor: &str
    ) -> Result<(withdrawal::Model, user::Model)> {
        let txn = self.db.begin().await?;

        let found = User::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn).await?
            .ok_or(AppError::NotFound { what: "User", ident: user_id.to_string() })?;

        if found.balance_cents < amount_cents {
            return Err(AppError::InsufficientFunds {
                requested_cents: amount_cents,
                available_cents: found.balance_cents,
            });
        }

        let balance_before = found.balance_cents;
        let mut active: user::ActiveModel = found.into();
        active.balance_cents = Set(balance_before - amount_cents);
        let debited = User::update(active).exec(&txn).await?;

        let request = withdrawal::ActiveModel {
            user_id: Set(user_id),
            amount_cents: Set(amount_cents),
            destination: Set(destination.to_string()),
            network: Set(network.to_string()),
            status: Set(WithdrawalStatus::Pending.as_str().to_string()),
            requested_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        let request = request.insert(&txn).await?;

        self.record_audit(
            &txn,
            actor,
            AuditAction::WithdrawRequest,
            AuditEntity::Withdrawal,
            request.id,
            json!({
                "before": serde_json::Value::Null,
                "after": request,
                "amount_cents": amount_cents,
                "balance_before_cents": balance_before,
                "balance_after_cents": debited.balance_cents,
            })
        ).await?;

        txn.commit().await?;
        Ok((request, debited))
    }

    /// Resolves a pending withdrawal. Approval only flips the status:
    /// the money already left the balance at request time. Denial flips
    /// the status and refunds the reserved amount in the same
    /// transaction. Any other starting status fails with
    /// InvalidTransition and changes nothing, which makes double taps
    /// on the same request harmless.
    pub async fn decide_withdrawal(
        &self,
        id: i64,
        decision: WithdrawalStatus,
        actor: &str,
        txid: Option<&str>,
        note: Option<&str>
    ) -> Result<withdrawal::Model> {
        if !decision.is_terminal() {
            return Err(AppError::InvalidInput("Decision must be approved or denied".to_string()));
        }

        let txn = self.db.begin().await?;

        let found = Withdrawal::find_by_id(id)
            .lock_exclusive()
            .one(&txn).await?
            .ok_or(AppError::NotFound { what: "Withdrawal", ident: id.to_string() })?;

        let current: WithdrawalStatus = found.status.parse()?;
        if current != WithdrawalStatus::Pending {
            return Err(AppError::InvalidTransition { id, status: current });
        }

        let before = found.clone();
        let mut active: withdrawal::ActiveModel = found.into();
        active.status = Set(decision.as_str().to_string());
        active.decided_at = Set(Some(chrono::Utc::now()));
        active.decided_by = Set(Some(actor.to_string()));
        active.txid = Set(txid.map(str::to_string));
        active.note = Set(note.map(str::to_string));
        let updated = Withdrawal::update(active).exec(&txn).await?;

        let meta = match decision {
            WithdrawalStatus::Denied => {
                let owner = User::find_by_id(updated.user_id)
                    .lock_exclusive()
                    .one(&txn).await?
                    .ok_or(AppError::NotFound {
                        what: "User",
                        ident: updated.user_id.to_string(),
                    })?;

                let balance_before = owner.balance_cents;
                let refunded = balance_before
                    .checked_add(updated.amount_cents)
                    .ok_or_else(|| AppError::InvalidInput("Balance overflow".to_string()))?;
                let mut active: user::ActiveModel = owner.into();
                active.balance_cents = Set(refunded);
                let owner = User::update(active).exec(&txn).await?;

                json!({
                    "before": before,
                    "after": updated,
                    "refunded": true,
                    "balance_before_cents": balance_before,
                    "balance_after_cents": owner.balance_cents,
                })
            }
            _ =>
                json!({
                    "before": before,
                    "after": updated,
                }),
        };

        let action = match decision {
            WithdrawalStatus::Denied => AuditAction::WithdrawalDeny,
            _ => AuditAction::WithdrawalApprove,
        };
        self.record_audit(&txn, actor, action, AuditEntity::Withdrawal, updated.id, meta).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn get_withdrawal(&self, id: i64) -> Result<withdrawal::Model> {
        Withdrawal::find_by_id(id)
            .one(&self.db).await?
            .ok_or(AppError::NotFound { what: "Withdrawal", ident: id.to_string() })
    }

    /// Pending requests come back oldest first so reviewers work the
    /// queue in arrival order; everything else comes back newest first.
    pub async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: u64,
        offset: u64
    ) -> Result<Vec<withdrawal::Model>> {
        let mut query = Withdrawal::find();

        if let Some(status) = status {
            query = query.filter(withdrawal::Column::Status.eq(status.as_str()));
        }

        query = match status {
            Some(WithdrawalStatus::Pending) =>
                query
                    .order_by_asc(withdrawal::Column::RequestedAt)
                    .order_by_asc(withdrawal::Column::Id),
            _ =>
                query
                    .order_by_desc(withdrawal::Column::RequestedAt)
                    .order_by_desc(withdrawal::Column::Id),
        };

        let rows = query.limit(limit).offset(offset).all(&self.db).await?;
        Ok(rows)
    }

    /// Pending queue joined with the requesting users, for review
    /// surfaces that show who asked.
    pub async fn list_pending_with_users(
        &self,
        limit: u64
    ) -> Result<Vec<(withdrawal::Model, Option<user::Model>)>> {
        let rows = Withdrawal::find()
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_str()))
            .find_also_related(User)
            .order_by_asc(withdrawal::Column::RequestedAt)
            .order_by_asc(withdrawal::Column::Id)
            .limit(limit)
            .all(&self.db).await?;

        Ok(rows)
    }

    pub async fn list_withdrawals_for_user(
        &self,
        user_id: i64,
        limit: u64
    ) -> Result<Vec<withdrawal::Model>> {
        let rows = Withdrawal::find()
            .filter(withdrawal::Column::UserId.eq(user_id))
            .order_by_desc(withdrawal::Column::RequestedAt)
            .order_by_desc(withdrawal::Column::Id)
            .limit(limit)
            .all(&self.db).await?;

        Ok(rows)
    }

    pub async fn all_withdrawals(&self) -> Result<Vec<withdrawal::Model>> {
        let rows = Withdrawal::find()
            .order_by_asc(withdrawal::Column::Id)
            .all(&self.db).await?;

        Ok(rows)
    }
}
