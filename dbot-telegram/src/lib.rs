//! # dbot-telegram
//!
//! Telegram connectivity for the command bot: [`TelegramConfig`] (token, API URL, timeouts,
//! retry policy) and [`TelegramTransport`], the [`dbot_core::Transport`] implementation over the
//! Bot API. No command or prompt logic lives here.

mod config;
mod transport;

pub use config::{TelegramConfig, DEFAULT_API_URL};
pub use transport::{TelegramTransport, RETRY_STATUSES};
