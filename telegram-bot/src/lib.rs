//! # Telegram command bot
//!
//! Runs the Receiver / Processor / Sender pipeline over a [`dbot_core::Transport`]: updates are
//! long-polled into an inbound queue, dispatched through the [`command_registry::CommandRegistry`]
//! (with per-chat prompt collection), and responses delivered from an outbound queue.

pub mod bot;
pub mod cli;
pub mod config;
pub mod greetings;
pub mod processor;
pub mod prompt;
pub mod queue;
pub mod runner;
pub mod workers;

pub use bot::{SendReport, TelegramBot, DEFAULT_RECEIVER_BACKOFF};
pub use cli::{load_config, Cli, Commands};
pub use config::BotConfig;
pub use greetings::{declare_greetings, ByeHandler, HelloHandler};
pub use processor::{Processor, DEFAULT_MENU_COMMAND, UNSUPPORTED_TEXT};
pub use prompt::{ActivePrompt, PromptStep, PromptTracker};
pub use queue::{Envelope, WorkQueue};
pub use runner::{build_registry, run_bot};
pub use workers::{run_processor, run_receiver, run_sender, truncate_text, MAX_MESSAGE_LENGTH};
