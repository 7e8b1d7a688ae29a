use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "TrustMe Ledger Bot Commands:")]
pub enum Command {
    #[command(description = "Register and see the welcome message")]
    Start,

    #[command(description = "Show this help message")]
    Help,

    #[command(description = "Show your balance")]
    Balance,

    #[command(description = "Top up your balance - Usage: /deposit <amount>")] Deposit(String),

    #[command(
        description = "Request a withdrawal - Usage: /withdraw <amount> <destination> [network]"
    )] Withdraw(String),

    #[command(description = "Your recent withdrawal requests")]
    History,

    #[command(description = "Show your account details")]
    Whoami,

    #[command(description = "Pending withdrawal queue (staff)")]
    Pending,

    #[command(description = "Approve a withdrawal (staff) - Usage: /approve <id> [txid]")] Approve(
        String,
    ),

    #[command(description = "Deny a withdrawal (staff) - Usage: /deny <id> [note]")] Deny(String),

    #[command(
        description = "Inspect or change a balance (staff) - Usage: /setbalance <ident> <get|set|add|sub> [amount]"
    )] SetBalance(String),

    #[command(
        description = "Change a user's role (staff) - Usage: /setrole <ident> <admin|manager|support|user>"
    )] SetRole(String),
}
