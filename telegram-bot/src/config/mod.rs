//! Bot configuration: Telegram transport settings plus default chat, log file and pipeline knobs.

mod bot_config;


pub use bot_config::{BotConfig, DEFAULT_LOG_FILE};
