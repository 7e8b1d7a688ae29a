use std::sync::Arc;

use axum::{ Json, Router, middleware, routing::{ get, post } };
use serde_json::json;

pub mod auth;
pub mod users;
pub mod withdrawals;
pub mod audit;
pub mod export;
pub mod sim;

use crate::config::Config;
use crate::services::{
    AuditService,
    BalanceService,
    ExportService,
    UserService,
    WithdrawalService,
};

/// Actor recorded for every mutation that arrives through the admin API.
pub const API_ACTOR: &str = "api:admin";

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub balances: Arc<BalanceService>,
    pub withdrawals: Arc<WithdrawalService>,
    pub audit: Arc<AuditService>,
    pub export: Arc<ExportService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        users: Arc<UserService>,
        balances: Arc<BalanceService>,
        withdrawals: Arc<WithdrawalService>,
        audit: Arc<AuditService>,
        export: Arc<ExportService>,
        config: Arc<Config>
    ) -> Self {
        Self {
            users,
            balances,
            withdrawals,
            audit,
            export,
            config,
        }
    }
}

/// Two surfaces: a public pair (health, Telegram login verification) and
/// the admin API behind the bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/users", get(users::list_users))
        .route("/api/users/{ident}", get(users::get_user))
        .route(
            "/api/users/{ident}/balance",
            get(users::get_balance).post(users::change_balance)
        )
        .route("/api/users/{ident}/role", post(users::set_role))
        .route("/api/users/{ident}/deposit", post(users::deposit))
        .route(
            "/api/withdrawals",
            get(withdrawals::list_withdrawals).post(withdrawals::create_withdrawal)
        )
        .route("/api/withdrawals/pending", get(withdrawals::pending_withdrawals))
        .route("/api/withdrawals/{id}", get(withdrawals::get_withdrawal))
        .route("/api/withdrawals/{id}/approve", post(withdrawals::approve_withdrawal))
        .route("/api/withdrawals/{id}/deny", post(withdrawals::deny_withdrawal))
        .route("/api/audit", get(audit::list_audit))
        .route("/api/export/{target}", get(export::export_entity))
        .route("/api/sim", get(sim::run_sim))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/telegram", post(auth::verify_telegram_login))
        .merge(admin)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
