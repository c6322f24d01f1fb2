//! Error types for the bot core.
//!
//! [`DbotError`] is the top-level error; [`HandlerError`] is what a command action returns for its own failures.

use thiserror::Error;

/// Top-level error for dbot (transport, config, handler, serialization, IO).
#[derive(Error, Debug)]
pub enum DbotError {
    /// Network or API failure talking to the messaging provider.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by command actions (bad state, failed work, missing argument).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Argument '{name}' has type {actual}, expected {expected}")]
    WrongArgumentType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("State error: {0}")]
    State(String),

    #[error("{0}")]
    Failed(String),
}

/// Result type for core operations; uses [`DbotError`].
pub type Result<T> = std::result::Result<T, DbotError>;
