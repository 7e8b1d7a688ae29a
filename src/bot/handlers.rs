use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::db::{ user, withdrawal };
use crate::enums::{ Role, WithdrawalStatus };
use crate::money;
use crate::services::withdrawal_service::DEFAULT_NETWORK;

use super::{ BotState, commands::Command, constants::messages as msg, keyboards };

// Handler for dispatcher-based command handling
pub async fn handle_command_dispatch(
    bot: Bot,
    message: Message,
    cmd: Command,
    state: Arc<BotState>
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    handle_command(bot, message, cmd, state).await?;
    Ok(())
}

pub async fn handle_command(
    bot: Bot,
    message: Message,
    cmd: Command,
    state: Arc<BotState>
) -> ResponseResult<()> {
    let chat_id = message.chat.id;
    let (user_id, username) = match message.from.as_ref() {
        Some(user) => (user.id.0 as i64, user.username.clone()),
        None => {
            return Ok(());
        }
    };

    match cmd {
        Command::Start => handle_start(bot, chat_id, user_id, username, state).await,
        Command::Help => handle_help(bot, chat_id).await,
        Command::Balance => handle_balance(bot, chat_id, user_id, username, state).await,
        Command::Deposit(args) =>
            handle_deposit(bot, chat_id, user_id, username, args, state).await,
        Command::Withdraw(args) =>
            handle_withdraw(bot, chat_id, user_id, username, args, state).await,
        Command::History => handle_history(bot, chat_id, user_id, username, state).await,
        Command::Whoami => handle_whoami(bot, chat_id, user_id, username, state).await,
        Command::Pending => handle_pending(bot, chat_id, user_id, state).await,
        Command::Approve(args) => handle_approve(bot, chat_id, user_id, args, state).await,
        Command::Deny(args) => handle_deny(bot, chat_id, user_id, args, state).await,
        Command::SetBalance(args) => handle_set_balance(bot, chat_id, user_id, args, state).await,
        Command::SetRole(args) => handle_set_role(bot, chat_id, user_id, args, state).await,
    }
}

async fn handle_start(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    state: Arc<BotState>
) -> ResponseResult<()> {
    match state.users.register(user_id, username.as_deref()).await {
        Ok(_) => bot.send_message(chat_id, msg::WELCOME).await?,
        Err(e) => bot.send_message(chat_id, format!("❌ {}", e)).await?,
    };
    Ok(())
}

async fn handle_help(bot: Bot, chat_id: ChatId) -> ResponseResult<()> {
    bot.send_message(chat_id, Command::descriptions().to_string()).await?;
    Ok(())
}

async fn handle_balance(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    state: Arc<BotState>
) -> ResponseResult<()> {
    match state.users.register(user_id, username.as_deref()).await {
        Ok(user) => {
            bot.send_message(
                chat_id,
                format!("💰 Balance: ${}", money::format_cents(user.balance_cents))
            ).await?;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_deposit(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    let args = args.trim();
    if args.is_empty() {
        bot.send_message(chat_id, msg::DEPOSIT_USAGE).await?;
        return Ok(());
    }

    let amount_cents = match money::parse_amount(args) {
        Ok(cents) => cents,
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    match state.balances.deposit(user_id, username.as_deref(), amount_cents).await {
        Ok(user) => {
            bot.send_message(
                chat_id,
                format!(
                    "✅ Deposited ${}. New balance: ${}",
                    money::format_cents(amount_cents),
                    money::format_cents(user.balance_cents)
                )
            ).await?;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_withdraw(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (amount_raw, destination, network) = match parts.as_slice() {
        [amount, destination] => (*amount, *destination, DEFAULT_NETWORK),
        [amount, destination, network] => (*amount, *destination, *network),
        _ => {
            bot.send_message(chat_id, msg::WITHDRAW_USAGE).await?;
            return Ok(());
        }
    };

    let amount_cents = match money::parse_amount(amount_raw) {
        Ok(cents) => cents,
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let actor = format!("tg:{}", user_id);
    match
        state.withdrawals.request(
            user_id,
            username.as_deref(),
            amount_cents,
            destination,
            network,
            &actor
        ).await
    {
        Ok((request, user)) => {
            bot.send_message(
                chat_id,
                format!(
                    "📨 Withdrawal #{} filed: ${} to {} [{}].\n\
                    The amount is reserved; remaining balance: ${}.\n\
                    You will be notified once it is reviewed.",
                    request.id,
                    money::format_cents(request.amount_cents),
                    request.destination,
                    request.network,
                    money::format_cents(user.balance_cents)
                )
            ).await?;

            notify_admins(&bot, &state, &request, &user).await;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_history(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if let Err(e) = state.users.register(user_id, username.as_deref()).await {
        bot.send_message(chat_id, format!("❌ {}", e)).await?;
        return Ok(());
    }

    match state.withdrawals.history_for(user_id, 10).await {
        Ok(rows) if rows.is_empty() => {
            bot.send_message(chat_id, msg::NO_HISTORY).await?;
        }
        Ok(rows) => {
            let mut lines = vec!["📋 Your withdrawal requests:".to_string()];
            for row in rows {
                lines.push(
                    format!(
                        "#{} ${} to {} [{}]: {}",
                        row.id,
                        money::format_cents(row.amount_cents),
                        row.destination,
                        row.network,
                        row.status
                    )
                );
            }
            bot.send_message(chat_id, lines.join("\n")).await?;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_whoami(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    username: Option<String>,
    state: Arc<BotState>
) -> ResponseResult<()> {
    match state.users.register(user_id, username.as_deref()).await {
        Ok(user) => {
            let handle = user.handle
                .as_deref()
                .map(|h| format!("@{}", h))
                .unwrap_or_else(|| "(no handle)".to_string());
            bot.send_message(
                chat_id,
                format!(
                    "🆔 {}\n👤 {}\n🎖 Role: {}\n💰 Balance: ${}\n📅 Since: {}",
                    user.external_id,
                    handle,
                    user.role,
                    money::format_cents(user.balance_cents),
                    user.created_at.format("%Y-%m-%d")
                )
            ).await?;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_pending(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if !state.users.is_admin(user_id).await {
        bot.send_message(chat_id, msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    match state.withdrawals.queue(10).await {
        Ok(rows) if rows.is_empty() => {
            bot.send_message(chat_id, msg::NO_PENDING).await?;
        }
        Ok(rows) => {
            for (row, requester) in rows {
                let who = match requester {
                    Some(user) => display_user(&user),
                    None => "unknown".to_string(),
                };
                let text = format!(
                    "#{} ${} to {} [{}]\nFrom: {}\nRequested: {}",
                    row.id,
                    money::format_cents(row.amount_cents),
                    row.destination,
                    row.network,
                    who,
                    row.requested_at.format("%Y-%m-%d %H:%M UTC")
                );
                bot
                    .send_message(chat_id, text)
                    .reply_markup(keyboards::withdrawal_decision(row.id)).await?;
            }
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_approve(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if !state.users.is_admin(user_id).await {
        bot.send_message(chat_id, msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    let (id, txid) = match parse_decision_args(&args) {
        Some(parsed) => parsed,
        None => {
            bot.send_message(chat_id, msg::APPROVE_USAGE).await?;
            return Ok(());
        }
    };

    let actor = format!("tg:{}", user_id);
    match state.withdrawals.approve(id, &actor, txid.as_deref()).await {
        Ok(row) => {
            bot.send_message(chat_id, format!("✅ Withdrawal #{} approved.", row.id)).await?;
            notify_requester(&bot, &state, &row).await;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_deny(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if !state.users.is_admin(user_id).await {
        bot.send_message(chat_id, msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    let (id, note) = match parse_decision_args(&args) {
        Some(parsed) => parsed,
        None => {
            bot.send_message(chat_id, msg::DENY_USAGE).await?;
            return Ok(());
        }
    };

    let actor = format!("tg:{}", user_id);
    match state.withdrawals.deny(id, &actor, note.as_deref()).await {
        Ok(row) => {
            bot.send_message(
                chat_id,
                format!(
                    "✅ Withdrawal #{} denied, ${} refunded.",
                    row.id,
                    money::format_cents(row.amount_cents)
                )
            ).await?;
            notify_requester(&bot, &state, &row).await;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

async fn handle_set_balance(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if !state.users.is_admin(user_id).await {
        bot.send_message(chat_id, msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [ident, "get"] => {
            match state.balances.get(ident).await {
                Ok(user) => {
                    bot.send_message(
                        chat_id,
                        format!(
                            "💰 {}: ${}",
                            display_user(&user),
                            money::format_cents(user.balance_cents)
                        )
                    ).await?;
                }
                Err(e) => {
                    bot.send_message(chat_id, format!("❌ {}", e)).await?;
                }
            }
        }
        [ident, op @ ("set" | "add" | "sub"), amount_raw] => {
            let amount_cents = match money::parse_amount(amount_raw) {
                Ok(cents) => cents,
                Err(e) => {
                    bot.send_message(chat_id, format!("❌ {}", e)).await?;
                    return Ok(());
                }
            };

            let actor = format!("tg:{}", user_id);
            let result = match *op {
                "set" => state.balances.set(ident, amount_cents, &actor).await,
                "add" => state.balances.add(ident, amount_cents, &actor).await,
                _ => state.balances.sub(ident, amount_cents, &actor).await,
            };

            match result {
                Ok(user) => {
                    bot.send_message(
                        chat_id,
                        format!(
                            "✅ {} balance is now ${}",
                            display_user(&user),
                            money::format_cents(user.balance_cents)
                        )
                    ).await?;
                }
                Err(e) => {
                    bot.send_message(chat_id, format!("❌ {}", e)).await?;
                }
            }
        }
        _ => {
            bot.send_message(chat_id, msg::SETBALANCE_USAGE).await?;
        }
    }
    Ok(())
}

async fn handle_set_role(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    args: String,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if !state.users.is_admin(user_id).await {
        bot.send_message(chat_id, msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    let parts: Vec<&str> = args.split_whitespace().collect();
    let (ident, role_raw) = match parts.as_slice() {
        [ident, role] => (*ident, *role),
        _ => {
            bot.send_message(chat_id, msg::SETROLE_USAGE).await?;
            return Ok(());
        }
    };

    let role = match role_raw.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let actor = format!("tg:{}", user_id);
    match state.users.set_role(ident, role, &actor).await {
        Ok(user) => {
            bot.send_message(
                chat_id,
                format!("🎖 {} is now {}", display_user(&user), user.role)
            ).await?;
        }
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

// "<id> [free text]" for /approve and /deny
fn parse_decision_args(args: &str) -> Option<(i64, Option<String>)> {
    let mut split = args.trim().splitn(2, char::is_whitespace);
    let id: i64 = split.next()?.parse().ok()?;
    let rest = split
        .next()
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string);
    Some((id, rest))
}

fn display_user(user: &user::Model) -> String {
    match user.handle.as_deref() {
        Some(handle) => format!("@{}", handle),
        None => user.external_id.to_string(),
    }
}

async fn notify_admins(
    bot: &Bot,
    state: &BotState,
    request: &withdrawal::Model,
    requester: &user::Model
) {
    let text = format!(
        "🔔 Withdrawal #{}\nFrom: {} ({})\nAmount: ${}\nTo: {} [{}]",
        request.id,
        display_user(requester),
        requester.external_id,
        money::format_cents(request.amount_cents),
        request.destination,
        request.network
    );

    for admin_id in &state.config.admin_ids {
        let send = bot
            .send_message(ChatId(*admin_id), text.clone())
            .reply_markup(keyboards::withdrawal_decision(request.id)).await;
        if let Err(e) = send {
            tracing::warn!("Failed to notify admin {}: {}", admin_id, e);
        }
    }
}

/// Tells the requesting user how their withdrawal was decided. Send
/// failures are logged, never propagated: the decision is already
/// committed.
pub(super) async fn notify_requester(bot: &Bot, state: &BotState, row: &withdrawal::Model) {
    let owner = match state.users.get_by_id(row.user_id).await {
        Ok(owner) => owner,
        Err(e) => {
            tracing::warn!("Failed to load requester for withdrawal {}: {}", row.id, e);
            return;
        }
    };

    let text = match row.status.parse::<WithdrawalStatus>() {
        Ok(WithdrawalStatus::Approved) => {
            let mut text = format!(
                "✅ Your withdrawal #{} for ${} was approved.",
                row.id,
                money::format_cents(row.amount_cents)
            );
            if let Some(txid) = row.txid.as_deref() {
                text.push_str(&format!("\nTransaction: {}", txid));
            }
            text
        }
        Ok(WithdrawalStatus::Denied) => {
            let mut text = format!(
                "❌ Your withdrawal #{} for ${} was denied. \
                The amount was returned to your balance.",
                row.id,
                money::format_cents(row.amount_cents)
            );
            if let Some(note) = row.note.as_deref() {
                text.push_str(&format!("\nNote: {}", note));
            }
            text
        }
        _ => {
            return;
        }
    };

    if let Err(e) = bot.send_message(ChatId(owner.external_id), text).await {
        tracing::warn!("Failed to notify user {}: {}", owner.external_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_decision_args;

    #[test]
    fn test_parse_decision_args() {
        assert_eq!(parse_decision_args("7"), Some((7, None)));
        assert_eq!(parse_decision_args("7 0xabc"), Some((7, Some("0xabc".to_string()))));
        assert_eq!(
            parse_decision_args("7 looks wrong, hold it"),
            Some((7, Some("looks wrong, hold it".to_string())))
        );
        assert_eq!(parse_decision_args(""), None);
        assert_eq!(parse_decision_args("abc"), None);
    }
}
