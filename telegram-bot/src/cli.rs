//! Command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;

#[derive(Parser)]
#[command(name = "telegram-bot")]
#[command(about = "Command bot for Telegram with prompted arguments and inline menus", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (config from env; flags override BOT_TOKEN and CHAT_ID).
    Run {
        #[arg(short, long)]
        token: Option<String>,
        #[arg(short, long)]
        chat_id: Option<String>,
    },
}

/// Load BotConfig from environment, applying CLI overrides.
pub fn load_config(token: Option<String>, chat_id: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token, chat_id)
}
