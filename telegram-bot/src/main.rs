//! Binary for the command bot: `/hello`, `/bonjour`, `/bye`, `/help` and the `/menu` keyboard.

use anyhow::Result;
use clap::Parser;
use telegram_bot::{load_config, run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token, chat_id } => {
            let config = load_config(token, chat_id)?;
            run_bot(config).await
        }
    }
}
