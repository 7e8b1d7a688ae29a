pub mod config;
pub mod enums;
pub mod error;
pub mod money;
pub mod sim;
pub mod db;
pub mod services;
pub mod api;
pub mod bot;

pub use config::Config;
pub use enums::{ Role, WithdrawalStatus, AuditAction, AuditEntity, SimMode, ExportEntity, ExportFormat };
pub use error::{ AppError, Result };
