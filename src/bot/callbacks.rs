use std::sync::Arc;

use teloxide::prelude::*;

use crate::error::AppError;

use super::{ BotState, constants::messages as msg, handlers };

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BotState>
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let admin_id = q.from.id.0 as i64;

    if !state.users.is_admin(admin_id).await {
        bot.answer_callback_query(q.id.clone()).text(msg::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    // Answer right away so the button stops spinning
    bot.answer_callback_query(q.id.clone()).await?;

    let data = match q.data {
        Some(ref data) => data.as_str(),
        None => {
            return Ok(());
        }
    };

    let (chat_id, message_id) = match q.message {
        Some(ref message) => (message.chat().id, message.id()),
        None => {
            return Ok(());
        }
    };

    let parts: Vec<&str> = data.split(':').collect();
    if let ["wd", verb @ ("approve" | "deny"), raw_id] = parts.as_slice() {
        let id: i64 = match raw_id.parse() {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!("Bad withdrawal id in callback data: {}", data);
                return Ok(());
            }
        };

        let actor = format!("tg:{}", admin_id);
        let decided = if *verb == "approve" {
            state.withdrawals.approve(id, &actor, None).await
        } else {
            state.withdrawals.deny(id, &actor, None).await
        };

        match decided {
            Ok(row) => {
                let outcome = if *verb == "approve" {
                    format!("✅ Withdrawal #{} approved by {}", row.id, actor)
                } else {
                    format!("❌ Withdrawal #{} denied by {}, amount refunded", row.id, actor)
                };
                bot.edit_message_text(chat_id, message_id, outcome).await?;
                handlers::notify_requester(&bot, &state, &row).await;
            }
            // Someone else decided it first; show where it ended up
            Err(e @ AppError::InvalidTransition { .. }) => {
                bot.edit_message_text(chat_id, message_id, format!("⚠️ {}", e)).await?;
            }
            Err(e) => {
                bot.edit_message_text(chat_id, message_id, format!("❌ {}", e)).await?;
            }
        }
    } else {
        tracing::warn!("Unknown callback data: {}", data);
    }

    Ok(())
}
