//! Inline menu keyboards built from the commands declared in a menu.

use dbot_core::{InlineButton, OutboundMessage, ReplyMarkup};
use tracing::{debug, error};

use crate::error::DispatchError;
use crate::registry::CommandRegistry;

/// Text shown above a menu with at least one button.
pub const MENU_CHOOSE_TEXT: &str = "Please choose an option:";
/// Text shown for a menu without commands.
pub const MENU_EMPTY_TEXT: &str = "No options available for this menu.";

impl CommandRegistry {
    /// One button per command declared in `menu`, in declaration order. The label is the
    /// capitalized symbol name and the callback data is the exact command identifier.
    pub fn menu_keyboard(&self, menu: &str) -> Result<ReplyMarkup, DispatchError> {
        let menu_symbol = self
            .resolve_menu(menu)
            .map_err(|_| DispatchError::MenuInvalid(menu.to_string()))?;
        let buttons = self
            .all_entries()
            .into_iter()
            .filter(|entry| entry.menu.as_ref() == Some(&menu_symbol))
            .map(|entry| InlineButton {
                text: entry.command.label(),
                callback_data: entry.command.value().to_string(),
            })
            .collect();
        Ok(ReplyMarkup::single_column(buttons))
    }

    /// Menu message: prompt text plus keyboard, or an error text for an invalid menu.
    pub fn render_menu(&self, menu: &str) -> OutboundMessage {
        match self.menu_keyboard(menu) {
            Ok(keyboard) => {
                debug!(menu = %menu, buttons = keyboard.button_count(), "menu rendered");
                let text = if keyboard.button_count() == 0 {
                    MENU_EMPTY_TEXT
                } else {
                    MENU_CHOOSE_TEXT
                };
                OutboundMessage::text(text).with_reply_markup(keyboard)
            }
            Err(e) => {
                error!(menu = %menu, error = %e, "menu error");
                OutboundMessage::text(e.to_string())
            }
        }
    }
}
