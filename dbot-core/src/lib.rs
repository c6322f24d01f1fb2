//! # dbot-core
//!
//! Core types and traits for the command bot: [`Symbol`] tables (dynamic enumeration),
//! [`Update`] / [`InboundEvent`] / [`OutboundMessage`], the [`CommandHandler`] capability interface,
//! the [`Transport`] boundary, errors and tracing initialization. Transport-agnostic; used by
//! command-registry, dbot-telegram and telegram-bot.

pub mod error;
pub mod handler;
pub mod logger;
pub mod symbol;
pub mod transport;
pub mod types;

pub use error::{DbotError, HandlerError, Result};
pub use handler::{
    Action, ActionArgs, ActionResult, ActionTable, ArgType, ArgValue, CommandHandler,
    ConversionError, Converter,
};
pub use logger::init_tracing;
pub use symbol::{derive_name, Symbol, SymbolError, SymbolKind, SymbolTable};
pub use transport::Transport;
pub use types::{
    CallbackQuery, Chat, ChatId, InboundEvent, IncomingMessage, InlineButton, OutboundMessage,
    ReplyMarkup, Update,
};
