use thiserror::Error;

use crate::money;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("{what} not found: {ident}")] NotFound {
        what: &'static str,
        ident: String,
    },

    #[error("Insufficient funds: requested {}, available {}",
        money::format_cents(*.requested_cents),
        money::format_cents(*.available_cents))]
    InsufficientFunds {
        requested_cents: i64,
        available_cents: i64,
    },

    #[error("Withdrawal #{id} is already {status}")] InvalidTransition {
        id: i64,
        status: crate::enums::WithdrawalStatus,
    },

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Unauthorized: {0}")] Unauthorized(String),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field) = match self {
            AppError::Database(e) => ("DATABASE_ERROR", e.to_string(), None),
            AppError::NotFound { .. } => ("NOT_FOUND", self.to_string(), None),
            AppError::InsufficientFunds { .. } =>
                ("INSUFFICIENT_FUNDS", self.to_string(), Some("amount".to_string())),
            AppError::InvalidTransition { .. } =>
                ("INVALID_TRANSITION", self.to_string(), None),
            AppError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None),
            AppError::Serialization(e) => ("SERIALIZATION_ERROR", e.to_string(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound { .. } => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::InsufficientFunds { .. } => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition { .. } => axum::http::StatusCode::CONFLICT,
            AppError::Unauthorized(_) => axum::http::StatusCode::UNAUTHORIZED,
            // Transactions never partially apply, so the caller may retry
            AppError::Database(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            AppError::Serialization(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
