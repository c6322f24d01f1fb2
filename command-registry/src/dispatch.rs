//! Handler resolution and invocation.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dbot_core::{ActionArgs, CommandHandler, OutboundMessage, Symbol};
use tracing::{debug, error, instrument};

use crate::error::DispatchError;
use crate::registry::CommandRegistry;

impl CommandRegistry {
    /// First handler in `handlers` exposing the command's target action.
    /// `None` when the command is not declared or no handler qualifies.
    pub fn find_handler<'h>(
        &self,
        command: &Symbol,
        handlers: &'h [Arc<dyn CommandHandler>],
    ) -> Option<&'h Arc<dyn CommandHandler>> {
        let entry = self.lookup(command.value())?;
        handlers.iter().find(|h| h.has_action(&entry.action))
    }

    /// Converts `arguments` per the declaration and runs the action on `handler`.
    ///
    /// The argument count must match exactly. The action's own result is returned unchanged;
    /// an action error or panic becomes [`DispatchError::HandlerFailed`].
    #[instrument(skip(self, handler, arguments), fields(handler = handler.name()))]
    pub fn invoke(
        &self,
        handler: &dyn CommandHandler,
        command: &Symbol,
        arguments: &[String],
    ) -> Result<Option<OutboundMessage>, DispatchError> {
        let entry = self.lookup(command.value()).ok_or_else(|| {
            error!(command = %command, "command not found");
            DispatchError::CommandNotFound(command.value().to_string())
        })?;

        if arguments.len() != entry.arg_names.len() {
            error!(
                command = %command,
                expected = entry.arg_names.len(),
                got = arguments.len(),
                "argument count mismatch"
            );
            return Err(DispatchError::ArgumentCountMismatch {
                command: command.value().to_string(),
                expected: entry.arg_names.len(),
                got: arguments.len(),
            });
        }

        let mut args = ActionArgs::new();
        for (name, raw) in entry.arg_names.iter().zip(arguments) {
            let expected = entry.arg_type(name);
            let value = expected.convert(raw).map_err(|e| {
                error!(command = %command, argument = %name, error = %e, "argument conversion failed");
                DispatchError::ArgumentTypeInvalid {
                    value: raw.clone(),
                    argument: name.clone(),
                    expected,
                }
            })?;
            args.push(name.clone(), value);
        }

        let action = handler.get_action(&entry.action).ok_or_else(|| {
            error!(command = %command, action = %entry.action, "action not found in handler");
            DispatchError::ActionNotFound {
                command: command.value().to_string(),
                action: entry.action.clone(),
            }
        })?;

        let outcome = catch_unwind(AssertUnwindSafe(|| action(&args)));
        match outcome {
            Ok(Ok(response)) => {
                debug!(command = %command, response = ?response, "command executed");
                Ok(response)
            }
            Ok(Err(e)) => {
                error!(command = %command, error = %e, "command action failed");
                Err(DispatchError::HandlerFailed {
                    command: command.value().to_string(),
                    reason: e.to_string(),
                })
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(command = %command, panic = %reason, "command action panicked");
                Err(DispatchError::HandlerFailed {
                    command: command.value().to_string(),
                    reason,
                })
            }
        }
    }

    /// [`find_handler`](Self::find_handler) then [`invoke`](Self::invoke).
    pub fn dispatch(
        &self,
        command: &Symbol,
        handlers: &[Arc<dyn CommandHandler>],
        arguments: &[String],
    ) -> Result<Option<OutboundMessage>, DispatchError> {
        if !self.contains(command.value()) {
            return Err(DispatchError::CommandNotFound(command.value().to_string()));
        }
        let handler = self
            .find_handler(command, handlers)
            .ok_or_else(|| DispatchError::HandlerNotFound(command.value().to_string()))?;
        self.invoke(handler.as_ref(), command, arguments)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
