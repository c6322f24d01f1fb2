//! Turns one inbound update into at most one outbound response.
//!
//! Order of checks for text: menu request, pending prompt (unless the text starts a registered
//! command, which cancels it), then command dispatch. Callbacks carry a command identifier and
//! no inline arguments. Every failure becomes a text response; nothing here returns an error.

use std::sync::Arc;

use command_registry::{CommandRegistry, DispatchError, RegistryEntry};
use dbot_core::{ChatId, CommandHandler, InboundEvent, OutboundMessage, Update};
use tracing::{debug, info, instrument, warn};

use crate::prompt::{PromptStep, PromptTracker};

pub const DEFAULT_MENU_COMMAND: &str = "/menu";
pub const UNSUPPORTED_TEXT: &str =
    "Sorry, I only support text messages and menu actions for now.";

type Response = Result<Option<OutboundMessage>, DispatchError>;

/// Per-event dispatch state. Owned by the processor worker; the prompt table is never shared.
pub struct Processor {
    registry: Arc<CommandRegistry>,
    handlers: Arc<[Arc<dyn CommandHandler>]>,
    prompts: PromptTracker,
    default_chat: ChatId,
    menu_command: String,
}

impl Processor {
    pub fn new(
        registry: Arc<CommandRegistry>,
        handlers: Arc<[Arc<dyn CommandHandler>]>,
        default_chat: ChatId,
    ) -> Self {
        Self {
            registry,
            handlers,
            prompts: PromptTracker::new(),
            default_chat,
            menu_command: DEFAULT_MENU_COMMAND.to_string(),
        }
    }

    /// Text that renders the menu keyboard instead of dispatching.
    pub fn with_menu_command(mut self, menu_command: impl Into<String>) -> Self {
        self.menu_command = menu_command.into();
        self
    }

    pub fn prompts(&self) -> &PromptTracker {
        &self.prompts
    }

    /// Handles one update. The response, if any, has a chat id (the event's, else the default)
    /// and a text (empty when the handler gave none).
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub fn handle(&mut self, update: &Update) -> Option<OutboundMessage> {
        let event = update.classify();
        debug!(event = ?event, "processing update");

        let response = match self.respond(&event) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "update handling failed");
                Some(OutboundMessage::text(e.to_string()))
            }
        };

        let fallback = event.chat_id().unwrap_or(&self.default_chat);
        response.map(|message| message.complete(fallback))
    }

    fn respond(&mut self, event: &InboundEvent) -> Response {
        match event {
            InboundEvent::Text { chat_id, text } => self.on_text(chat_id, text),
            InboundEvent::Callback { chat_id, data } => self.on_callback(chat_id, data),
            InboundEvent::Unsupported { chat_id } => {
                debug!(chat_id = ?chat_id, "unsupported update");
                Ok(Some(OutboundMessage::text(UNSUPPORTED_TEXT)))
            }
        }
    }

    fn on_text(&mut self, chat_id: &ChatId, text: &str) -> Response {
        if text.trim() == self.menu_command {
            return Ok(Some(self.registry.render_menu(&self.menu_command)));
        }

        let mut tokens = text.split_whitespace();
        let command = tokens.next().unwrap_or_default();

        if self.prompts.is_collecting(chat_id) {
            if !self.registry.contains(command) {
                return self.continue_prompt(chat_id, text);
            }
            self.prompts.cancel(chat_id);
            info!(chat_id = %chat_id, command = %command, "new command replaces pending prompt");
        }

        match self.registry.lookup(command) {
            Some(entry) => {
                let arguments: Vec<String> = tokens.map(str::to_string).collect();
                self.start_command(chat_id, &entry, arguments)
            }
            None => {
                debug!(chat_id = %chat_id, command = %command, "command not recognized");
                Ok(Some(OutboundMessage::text(format!(
                    "Command '{}' not recognized.",
                    command
                ))))
            }
        }
    }

    fn on_callback(&mut self, chat_id: &ChatId, data: &str) -> Response {
        let Some(entry) = self.registry.lookup(data) else {
            debug!(chat_id = %chat_id, data = %data, "callback not recognized");
            return Ok(Some(OutboundMessage::text(format!(
                "Action '{}' not recognized.",
                data
            ))));
        };
        if self.prompts.cancel(chat_id).is_some() {
            info!(chat_id = %chat_id, command = %data, "callback replaces pending prompt");
        }
        self.start_command(chat_id, &entry, Vec::new())
    }

    /// Asks the first question when the command needs more arguments than given; else invokes.
    fn start_command(
        &mut self,
        chat_id: &ChatId,
        entry: &RegistryEntry,
        arguments: Vec<String>,
    ) -> Response {
        if entry.has_prompts() && arguments.len() < entry.arg_names.len() {
            if !arguments.is_empty() {
                debug!(
                    command = %entry.command,
                    given = arguments.len(),
                    "partial inline arguments discarded, asking all questions"
                );
            }
            self.prompts.start(chat_id.clone(), entry.identifier());
            return Ok(Some(OutboundMessage::text(entry.prompts[0].clone())));
        }
        info!(chat_id = %chat_id, command = %entry.command, args = arguments.len(), "dispatching command");
        self.registry
            .dispatch(&entry.command, &self.handlers, &arguments)
    }

    fn continue_prompt(&mut self, chat_id: &ChatId, answer: &str) -> Response {
        let command = match self.prompts.pending(chat_id) {
            Some(prompt) => prompt.command.clone(),
            None => return Ok(None),
        };
        let Some(entry) = self.registry.lookup(&command) else {
            // Removed between prompt start and this answer; the user must re-issue the command.
            self.prompts.cancel(chat_id);
            return Err(DispatchError::CommandNotFound(command));
        };

        match self
            .prompts
            .record_answer(chat_id, answer.to_string(), &entry.prompts)
        {
            Some(PromptStep::Ask(question)) => Ok(Some(OutboundMessage::text(question))),
            Some(PromptStep::Complete { answers, .. }) => {
                info!(chat_id = %chat_id, command = %entry.command, "dispatching prompted command");
                self.registry
                    .dispatch(&entry.command, &self.handlers, &answers)
            }
            None => Ok(None),
        }
    }
}
