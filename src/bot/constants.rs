// Reply texts
pub mod messages {
    pub const WELCOME: &str =
        "👋 Welcome to TrustMe Ledger!\n\n\
        💰 /balance - check your balance\n\
        💵 /deposit <amount> - top up\n\
        💸 /withdraw <amount> <destination> - request a payout\n\
        📋 /history - your withdrawal requests\n\
        ❓ /help - all commands";

    pub const NOT_AUTHORIZED: &str = "⛔ This command is for staff only.";

    pub const DEPOSIT_USAGE: &str = "Usage: /deposit <amount>\nExample: /deposit 100.50";

    pub const WITHDRAW_USAGE: &str =
        "Usage: /withdraw <amount> <destination> [network]\nExample: /withdraw 25 TXabc123 USDT";

    pub const APPROVE_USAGE: &str = "Usage: /approve <id> [txid]";

    pub const DENY_USAGE: &str = "Usage: /deny <id> [note]";

    pub const SETBALANCE_USAGE: &str =
        "Usage: /setbalance <ident> <get|set|add|sub> [amount]\n\
        Example: /setbalance @alice add 50";

    pub const SETROLE_USAGE: &str =
        "Usage: /setrole <ident> <admin|manager|support|user>\nExample: /setrole @alice manager";

    pub const NO_PENDING: &str = "✅ No pending withdrawals.";

    pub const NO_HISTORY: &str = "You have no withdrawal requests yet.";
}
