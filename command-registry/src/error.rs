//! Declaration and dispatch errors. The `Display` text of [`DispatchError`] is what the chat user sees.

use dbot_core::ArgType;
use thiserror::Error;

/// Rejected command declaration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclareError {
    #[error("command identifier must not be empty")]
    EmptyIdentifier,

    #[error("command identifier '{identifier}' is {len} bytes; callback data allows at most {max}")]
    IdentifierTooLong {
        identifier: String,
        len: usize,
        max: usize,
    },

    #[error("command '{0}' has no target action")]
    EmptyAction(String),

    #[error("command '{identifier}' declares argument '{argument}' twice")]
    DuplicateArgument {
        identifier: String,
        argument: String,
    },

    #[error("command '{identifier}' declares {prompts} prompt(s) for {args} argument(s)")]
    PromptCountMismatch {
        identifier: String,
        prompts: usize,
        args: usize,
    },
}

/// Failure while resolving or invoking a command. Never fatal to the dispatcher.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Command '{0}' not found.")]
    CommandNotFound(String),

    #[error("Error: wrong number of arguments for '{command}'. Expected: {expected}, received: {got}.")]
    ArgumentCountMismatch {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument '{value}' for '{argument}' is invalid. Expected type: {expected}.")]
    ArgumentTypeInvalid {
        value: String,
        argument: String,
        expected: ArgType,
    },

    #[error("Error: action '{action}' for '{command}' not found.")]
    ActionNotFound { command: String, action: String },

    #[error("Error: no handler found for command '{0}'.")]
    HandlerNotFound(String),

    #[error("Error: menu '{0}' is not valid.")]
    MenuInvalid(String),

    #[error("Error while running '{command}': {reason}")]
    HandlerFailed { command: String, reason: String },
}
