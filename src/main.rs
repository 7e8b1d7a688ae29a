use std::sync::Arc;

use anyhow::Context;
use migration::{ Migrator, MigratorTrait };
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };
use trustme_ledger::Config;
use trustme_ledger::db::LedgerRepository;
use trustme_ledger::services::{
    AuditService,
    BalanceService,
    ExportService,
    UserService,
    WithdrawalService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "trustme_ledger=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    tracing::info!("Starting trustme-ledger");

    // Initialize database connection
    let mut connect_options = sea_orm::ConnectOptions::new(config.database_url.clone());
    connect_options.acquire_timeout(config.db_acquire_timeout);

    let db = sea_orm::Database
        ::connect(connect_options).await
        .context("Failed to connect to database")?;

    tracing::info!("Database connected successfully");

    // Run migrations
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    tracing::info!("Migrations completed successfully");

    let config = Arc::new(config);

    // Initialize repository
    let repository = Arc::new(LedgerRepository::new(db));

    // Initialize services
    let users = Arc::new(UserService::new(repository.clone(), config.admin_ids.clone()));
    let balances = Arc::new(BalanceService::new(repository.clone()));
    let withdrawals = Arc::new(WithdrawalService::new(repository.clone()));
    let audit = Arc::new(AuditService::new(repository.clone()));
    let export = Arc::new(ExportService::new(repository.clone()));

    // Start the Telegram bot alongside the HTTP server
    tokio::spawn(
        trustme_ledger::bot::run_bot(
            users.clone(),
            balances.clone(),
            withdrawals.clone(),
            config.clone()
        )
    );

    // Create app state
    let app_state = trustme_ledger::api::AppState::new(
        users,
        balances,
        withdrawals,
        audit,
        export,
        config.clone()
    );

    // Build application router
    let app = trustme_ledger::api
        ::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
