use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    DatabaseConnection,
    DatabaseTransaction,
    DbErr,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    Set,
    TransactionTrait,
    sea_query::OnConflict,
};
use serde_json::json;

use crate::enums::{ AuditAction, AuditEntity, Role };
use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

mod withdrawals;

/// Durable store for users, withdrawals and the audit trail. Every
/// mutation runs inside a single transaction with the affected rows
/// locked, and writes its audit entry before committing; this is the
/// only serialization point in the system.
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, external_id: i64) -> Result<user::Model> {
        User::find()
            .filter(user::Column::ExternalId.eq(external_id))
            .one(&self.db).await?
            .ok_or(AppError::NotFound { what: "User", ident: external_id.to_string() })
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<user::Model> {
        User::find_by_id(id)
            .one(&self.db).await?
            .ok_or(AppError::NotFound { what: "User", ident: id.to_string() })
    }

    /// Admin lookup by Telegram id or "@handle".
    pub async fn find_user(&self, ident: &str) -> Result<user::Model> {
        let ident = ident.trim();
        if let Some(handle) = ident.strip_prefix('@') {
            return User::find()
                .filter(user::Column::Handle.eq(handle))
                .one(&self.db).await?
                .ok_or(AppError::NotFound { what: "User", ident: ident.to_string() });
        }

        let external_id: i64 = ident
            .parse()
            .map_err(|_| {
                AppError::InvalidInput(format!("Expected a Telegram id or @handle, got: {}", ident))
            })?;
        self.get_user(external_id).await
    }

    /// Idempotent registration keyed by external_id. An existing row is
    /// returned unchanged; handle, role and balance are never overwritten
    /// here. Safe under concurrent first contact: the insert is
    /// on-conflict-do-nothing and the row is re-read afterwards.
    pub async fn upsert_user(&self, external_id: i64, handle: Option<&str>) -> Result<user::Model> {
        if
            let Some(existing) = User::find()
                .filter(user::Column::ExternalId.eq(external_id))
                .one(&self.db).await?
        {
            return Ok(existing);
        }

        let fresh = user::ActiveModel {
            external_id: Set(external_id),
            handle: Set(handle.map(str::to_string)),
            role: Set(Role::User.as_str().to_string()),
            balance_cents: Set(0),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        match
            User::insert(fresh)
                .on_conflict(
                    OnConflict::column(user::Column::ExternalId).do_nothing().to_owned()
                )
                .exec(&self.db).await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => {
                return Err(e.into());
            }
        }

        self.get_user(external_id).await
    }

    /// Applies `balance += delta` if the result stays non-negative,
    /// otherwise fails with InsufficientFunds and leaves the row
    /// untouched. The read, the write and the audit entry share one
    /// transaction with the user row locked.
    pub async fn adjust_balance(
        &self,
        user_id: i64,
        delta: i64,
        actor: &str,
        action: AuditAction
    ) -> Result<user::Model> {
        let txn = self.db.begin().await?;

        let found = User::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn).await?
            .ok_or(AppError::NotFound { what: "User", ident: user_id.to_string() })?;

        let new_balance = found.balance_cents
            .checked_add(delta)
            .ok_or_else(|| AppError::InvalidInput("Balance overflow".to_string()))?;
        if new_balance < 0 {
            return Err(AppError::InsufficientFunds {
                requested_cents: -delta,
                available_cents: found.balance_cents,
            });
        }

        let before = found.clone();
        let mut active: user::ActiveModel = found.into();
        active.balance_cents = Set(new_balance);
        let updated = User::update(active).exec(&txn).await?;

        self.record_audit(
            &txn,
            actor,
            action,
            AuditEntity::User,
            updated.id,
            json!({
                "before": before,
                "after": updated,
                "amount_cents": delta.abs(),
            })
        ).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Absolute balance assignment. The caller validates non-negativity
    /// before this is reached.
    pub async fn set_balance(
        &self,
        user_id: i64,
        balance_cents: i64,
        actor: &str
    ) -> Result<user::Model> {
        let txn = self.db.begin().await?;

        let found = User::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn).await?
            .ok_or(AppError::NotFound { what: "User", ident: user_id.to_string() })?;

        let before = found.clone();
        let mut active: user::ActiveModel = found.into();
        active.balance_cents = Set(balance_cents);
        let updated = User::update(active).exec(&txn).await?;

        self.record_audit(
            &txn,
            actor,
            AuditAction::BalanceSet,
            AuditEntity::User,
            updated.id,
            json!({
                "before": before,
                "after": updated,
                "amount_cents": balance_cents,
            })
        ).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn set_role(&self, user_id: i64, role: Role, actor: &str) -> Result<user::Model> {
        let txn = self.db.begin().await?;

        let found = User::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn).await?
            .ok_or(AppError::NotFound { what: "User", ident: user_id.to_string() })?;

        let before = found.clone();
        let mut active: user::ActiveModel = found.into();
        active.role = Set(role.as_str().to_string());
        let updated = User::update(active).exec(&txn).await?;

        self.record_audit(
            &txn,
            actor,
            AuditAction::RoleSet,
            AuditEntity::User,
            updated.id,
            json!({
                "before": before,
                "after": updated,
            })
        ).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn list_users(&self, limit: u64, offset: u64) -> Result<Vec<user::Model>> {
        let users = User::find()
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db).await?;

        Ok(users)
    }

    pub async fn all_users(&self) -> Result<Vec<user::Model>> {
        let users = User::find().order_by_asc(user::Column::Id).all(&self.db).await?;
        Ok(users)
    }

    /// Appends one audit entry inside the caller's open transaction. A
    /// failure here fails the whole transaction; an unaudited mutation
    /// must never commit.
    pub(crate) async fn record_audit(
        &self,
        txn: &DatabaseTransaction,
        actor: &str,
        action: AuditAction,
        entity_type: AuditEntity,
        entity_id: i64,
        meta: serde_json::Value
    ) -> Result<audit_log::Model> {
        let entry = audit_log::ActiveModel {
            actor: Set(actor.to_string()),
            action: Set(action.as_str().to_string()),
            entity_type: Set(entity_type.as_str().to_string()),
            entity_id: Set(entity_id),
            meta: Set(meta),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let entry = entry.insert(txn).await?;
        Ok(entry)
    }

    pub async fn list_audit(
        &self,
        limit: u64,
        actor: Option<&str>,
        action: Option<AuditAction>
    ) -> Result<Vec<audit_log::Model>> {
        let mut query = AuditLog::find().order_by_desc(audit_log::Column::Id);

        if let Some(actor) = actor {
            query = query.filter(audit_log::Column::Actor.eq(actor));
        }
        if let Some(action) = action {
            query = query.filter(audit_log::Column::Action.eq(action.as_str()));
        }

        let entries = query.limit(limit).all(&self.db).await?;
        Ok(entries)
    }

    pub async fn all_audit(&self) -> Result<Vec<audit_log::Model>> {
        let entries = AuditLog::find()
            .order_by_asc(audit_log::Column::Id)
            .all(&self.db).await?;

        Ok(entries)
    }
}
