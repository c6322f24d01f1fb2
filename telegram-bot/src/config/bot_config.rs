//! BotConfig: [`TelegramConfig`] + default chat, log file, receiver backoff, menu command.
//! Env: CHAT_ID (required), LOG_FILE, RECEIVER_BACKOFF_SECS, MENU_COMMAND.

use anyhow::Result;
use dbot_core::ChatId;
use dbot_telegram::TelegramConfig;
use std::env;
use std::time::Duration;

use crate::processor::DEFAULT_MENU_COMMAND;

pub const DEFAULT_LOG_FILE: &str = "logs/telegram-bot.log";

/// Full bot config. Use [`BotConfig::load`] then [`BotConfig::validate`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    /// Destination for responses whose trigger carried no chat, and for the start greeting.
    pub chat_id: ChatId,
    pub log_file: String,
    pub receiver_backoff_secs: u64,
    pub menu_command: String,
}

impl BotConfig {
    /// Loads from env. `token` overrides BOT_TOKEN and `chat_id` overrides CHAT_ID.
    pub fn load(token: Option<String>, chat_id: Option<String>) -> Result<Self> {
        let telegram = TelegramConfig::load(token)?;
        let chat_id = match chat_id {
            Some(chat_id) => chat_id,
            None => env::var("CHAT_ID").map_err(|_| anyhow::anyhow!("CHAT_ID not set"))?,
        };
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let receiver_backoff_secs = match env::var("RECEIVER_BACKOFF_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("RECEIVER_BACKOFF_SECS has an invalid value: {}", raw)
            })?,
            Err(_) => 3,
        };
        let menu_command =
            env::var("MENU_COMMAND").unwrap_or_else(|_| DEFAULT_MENU_COMMAND.to_string());

        Ok(Self {
            telegram,
            chat_id: ChatId::parse(&chat_id),
            log_file,
            receiver_backoff_secs,
            menu_command,
        })
    }

    /// Checks the transport config and the bot's own fields. Call before init.
    pub fn validate(&self) -> Result<()> {
        self.telegram.validate()?;
        if let ChatId::Username(name) = &self.chat_id {
            if name.is_empty() {
                anyhow::bail!("CHAT_ID is empty");
            }
        }
        if self.log_file.trim().is_empty() {
            anyhow::bail!("LOG_FILE is empty");
        }
        if self.menu_command.trim().is_empty() {
            anyhow::bail!("MENU_COMMAND is empty");
        }
        Ok(())
    }

    pub fn bot_token(&self) -> &str {
        &self.telegram.bot_token
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn receiver_backoff(&self) -> Duration {
        Duration::from_secs(self.receiver_backoff_secs)
    }
}
