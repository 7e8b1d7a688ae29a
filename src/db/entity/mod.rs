pub mod user;
pub mod withdrawal;
pub mod audit_log;

pub use user::Entity as User;
pub use withdrawal::Entity as Withdrawal;
pub use audit_log::Entity as AuditLog;
