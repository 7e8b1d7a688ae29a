pub mod user_service;
pub mod balance_service;
pub mod withdrawal_service;
pub mod audit_service;
pub mod export_service;

pub use user_service::UserService;
pub use balance_service::BalanceService;
pub use withdrawal_service::WithdrawalService;
pub use audit_service::AuditService;
pub use export_service::ExportService;

/// Hard ceiling for any paginated listing.
pub const MAX_PAGE_SIZE: u64 = 500;

pub const DEFAULT_PAGE_SIZE: u64 = 50;

pub const DEFAULT_AUDIT_LIMIT: u64 = 200;
