//! Built-in `/help`: lists every declared command with its description.

use std::sync::Arc;

use dbot_core::{Action, ActionArgs, CommandHandler, OutboundMessage, Symbol};

use crate::error::DeclareError;
use crate::registry::{CommandDeclaration, CommandRegistry};

pub const HELP_COMMAND: &str = "/help";
const HELP_ACTION: &str = "help";

/// Handler answering `/help` from the registry contents.
pub struct HelpHandler {
    registry: Arc<CommandRegistry>,
}

impl HelpHandler {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Declares `/help`, optionally inside `menu`.
    pub fn declare(registry: &CommandRegistry, menu: Option<&str>) -> Result<Symbol, DeclareError> {
        let mut declaration = CommandDeclaration::new(HELP_COMMAND, HELP_ACTION)
            .description("List all available commands");
        if let Some(menu) = menu {
            declaration = declaration.menu(menu);
        }
        registry.declare(declaration)
    }

    /// Markdown list of commands in declaration order.
    pub fn help_text(&self) -> String {
        let mut text = String::from("Available commands:\n");
        for entry in self.registry.all_entries() {
            let description = if entry.description.is_empty() {
                "No description."
            } else {
                entry.description.as_str()
            };
            text.push_str(&format!("\n• `{}` : {}", entry.identifier(), description));
        }
        text
    }
}

impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "HelpHandler"
    }

    fn get_action(&self, action: &str) -> Option<Action<'_>> {
        match action {
            HELP_ACTION => Some(Box::new(move |_: &ActionArgs| {
                Ok(Some(
                    OutboundMessage::text(self.help_text()).with_parse_mode("Markdown"),
                ))
            })),
            _ => None,
        }
    }
}
