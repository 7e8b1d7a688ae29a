use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Role ────────────────────────────────────────────────────────────

/// Access level stored on a user row. Admin gating itself happens in the
/// adapters; the ledger only stores and reports the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Support,
    User,
}

impl Role {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Support => "support",
            Role::User => "user",
        }
    }

    /// Whether this role may approve/deny withdrawals and override balances.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::Support, Role::User]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "support" => Ok(Role::Support),
            "user" => Ok(Role::User),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid role: {}. Supported: admin, manager, support, user",
                s
            ))),
        }
    }
}

// ─── WithdrawalStatus ────────────────────────────────────────────────

/// Lifecycle of a withdrawal request. Approved and denied are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Denied,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Denied => "denied",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "denied" | "rejected" => Ok(WithdrawalStatus::Denied),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid withdrawal status: {}. Supported: pending, approved, denied",
                s
            ))),
        }
    }
}

// ─── AuditAction ─────────────────────────────────────────────────────

/// Every mutating operation writes exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BalanceSet,
    BalanceAdd,
    BalanceSub,
    RoleSet,
    WithdrawRequest,
    WithdrawalApprove,
    WithdrawalDeny,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BalanceSet => "balance_set",
            AuditAction::BalanceAdd => "balance_add",
            AuditAction::BalanceSub => "balance_sub",
            AuditAction::RoleSet => "role_set",
            AuditAction::WithdrawRequest => "withdraw_request",
            AuditAction::WithdrawalApprove => "withdrawal_approve",
            AuditAction::WithdrawalDeny => "withdrawal_deny",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balance_set" => Ok(AuditAction::BalanceSet),
            "balance_add" => Ok(AuditAction::BalanceAdd),
            "balance_sub" => Ok(AuditAction::BalanceSub),
            "role_set" => Ok(AuditAction::RoleSet),
            "withdraw_request" => Ok(AuditAction::WithdrawRequest),
            "withdrawal_approve" => Ok(AuditAction::WithdrawalApprove),
            "withdrawal_deny" => Ok(AuditAction::WithdrawalDeny),
            _ => Err(AppError::InvalidInput(format!("Invalid audit action: {}", s))),
        }
    }
}

// ─── AuditEntity ─────────────────────────────────────────────────────

/// What kind of row an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEntity {
    User,
    Withdrawal,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::User => "user",
            AuditEntity::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEntity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(AuditEntity::User),
            "withdrawal" => Ok(AuditEntity::Withdrawal),
            _ => Err(AppError::InvalidInput(format!("Invalid audit entity: {}", s))),
        }
    }
}

// ─── SimMode ─────────────────────────────────────────────────────────

/// Profit-projection mode for the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimMode {
    Reinvest,
    Withdraw,
    WithdrawAnytime,
}

impl SimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimMode::Reinvest => "reinvest",
            SimMode::Withdraw => "withdraw",
            SimMode::WithdrawAnytime => "withdraw_anytime",
        }
    }
}

impl fmt::Display for SimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reinvest" => Ok(SimMode::Reinvest),
            "withdraw" => Ok(SimMode::Withdraw),
            "withdraw_anytime" | "anytime" => Ok(SimMode::WithdrawAnytime),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid sim mode: {}. Supported: reinvest, withdraw, withdraw_anytime",
                s
            ))),
        }
    }
}

// ─── Export ──────────────────────────────────────────────────────────

/// Tables the export endpoint can dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportEntity {
    Users,
    Withdrawals,
    Audit,
}

impl FromStr for ExportEntity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" => Ok(ExportEntity::Users),
            "withdrawals" => Ok(ExportEntity::Withdrawals),
            "audit" => Ok(ExportEntity::Audit),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid export entity: {}. Supported: users, withdrawals, audit",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(AppError::InvalidInput(format!("Invalid export format: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in Role::all() {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::Support.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("PENDING".parse::<WithdrawalStatus>().unwrap(), WithdrawalStatus::Pending);
        assert_eq!("rejected".parse::<WithdrawalStatus>().unwrap(), WithdrawalStatus::Denied);
        assert!("cancelled".parse::<WithdrawalStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!WithdrawalStatus::Pending.is_terminal());
        assert!(WithdrawalStatus::Approved.is_terminal());
        assert!(WithdrawalStatus::Denied.is_terminal());
    }

    #[test]
    fn test_audit_action_strings() {
        assert_eq!(AuditAction::WithdrawRequest.as_str(), "withdraw_request");
        assert_eq!(AuditAction::BalanceSub.to_string(), "balance_sub");
        assert_eq!("withdrawal_deny".parse::<AuditAction>().unwrap(), AuditAction::WithdrawalDeny);
    }

    #[test]
    fn test_export_parsing() {
        assert_eq!("users".parse::<ExportEntity>().unwrap(), ExportEntity::Users);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("wallets".parse::<ExportEntity>().is_err());
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
