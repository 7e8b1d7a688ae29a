use teloxide::types::{ InlineKeyboardButton, InlineKeyboardMarkup };

// Approve/Deny row attached to withdrawal review messages
pub fn withdrawal_decision(withdrawal_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        vec![
            vec![
                InlineKeyboardButton::callback("✅ Approve", format!("wd:approve:{}", withdrawal_id)),
                InlineKeyboardButton::callback("❌ Deny", format!("wd:deny:{}", withdrawal_id))
            ]
        ]
    )
}
