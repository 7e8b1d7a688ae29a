pub mod handlers;
pub mod commands;
pub mod constants;
pub mod keyboards;
mod callbacks;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::dispatching::{ UpdateHandler, UpdateFilterExt };
use teloxide::utils::command::BotCommands;

use crate::config::Config;
use crate::services::{ BalanceService, UserService, WithdrawalService };

#[derive(Clone)]
pub struct BotState {
    pub users: Arc<UserService>,
    pub balances: Arc<BalanceService>,
    pub withdrawals: Arc<WithdrawalService>,
    pub config: Arc<Config>,
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let command_handler = Update::filter_message()
        .filter_command::<commands::Command>()
        .endpoint(handlers::handle_command_dispatch);

    let callback_handler = Update::filter_callback_query().endpoint(callbacks::handle_callback);

    dptree::entry().branch(command_handler).branch(callback_handler)
}

pub async fn run_bot(
    users: Arc<UserService>,
    balances: Arc<BalanceService>,
    withdrawals: Arc<WithdrawalService>,
    config: Arc<Config>
) {
    tracing::info!("Starting Telegram bot...");

    let bot = Bot::new(config.telegram_bot_token.clone());

    // Set bot commands for slash menu
    if let Err(e) = bot.set_my_commands(commands::Command::bot_commands()).await {
        tracing::warn!("Failed to set bot commands: {}", e);
    }

    let state = Arc::new(BotState {
        users,
        balances,
        withdrawals,
        config,
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
