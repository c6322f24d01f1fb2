//! # command-registry
//!
//! Command table shared by the dispatcher: [`CommandRegistry::declare`] stores a
//! [`RegistryEntry`] per command identifier; [`CommandRegistry::find_handler`] and
//! [`CommandRegistry::invoke`] resolve and run the target action on a
//! [`CommandHandler`](dbot_core::CommandHandler); [`CommandRegistry::render_menu`] builds inline
//! keyboards. Build the registry once at startup and pass it around as `Arc<CommandRegistry>`.

mod dispatch;
mod error;
mod help;
mod menu;
mod registry;

pub use error::{DeclareError, DispatchError};
pub use help::{HelpHandler, HELP_COMMAND};
pub use menu::{MENU_CHOOSE_TEXT, MENU_EMPTY_TEXT};
pub use registry::{CommandDeclaration, CommandRegistry, RegistryEntry, MAX_IDENTIFIER_LEN};
