//! Demo handlers for the binary: `/hello`, `/bonjour <name> <age>` (prompted) and `/bye`.

use command_registry::{CommandDeclaration, CommandRegistry, DeclareError};
use dbot_core::{Action, ActionArgs, ActionResult, ArgType, CommandHandler, OutboundMessage};

/// Greets, either plainly or by name and age.
pub struct HelloHandler;

impl HelloHandler {
    fn hello(&self) -> ActionResult {
        Ok(Some(OutboundMessage::text("Hello!!!!!")))
    }

    fn bonjour(&self, args: &ActionArgs) -> ActionResult {
        let name = args.str("name")?;
        let age = args.int("age")?;
        let remark = if age < 18 {
            "you are young!"
        } else {
            "you are an adult."
        };
        Ok(Some(OutboundMessage::text(format!(
            "Hello, {}! At {}, {}",
            name, age, remark
        ))))
    }
}

impl CommandHandler for HelloHandler {
    fn name(&self) -> &str {
        "HelloHandler"
    }

    fn get_action(&self, action: &str) -> Option<Action<'_>> {
        match action {
            "hello" => Some(Box::new(move |_: &ActionArgs| self.hello())),
            "bonjour" => Some(Box::new(move |args: &ActionArgs| self.bonjour(args))),
            _ => None,
        }
    }
}

pub struct ByeHandler;

impl CommandHandler for ByeHandler {
    fn name(&self) -> &str {
        "ByeHandler"
    }

    fn get_action(&self, action: &str) -> Option<Action<'_>> {
        match action {
            "bye" => Some(Box::new(|_: &ActionArgs| {
                Ok(Some(OutboundMessage::text("Bye!!!!!")))
            })),
            _ => None,
        }
    }
}

/// Declares the greeting commands, all inside `menu`.
pub fn declare_greetings(registry: &CommandRegistry, menu: &str) -> Result<(), DeclareError> {
    registry.declare(
        CommandDeclaration::new("/hello", "hello")
            .description("Simple greeting without arguments")
            .menu(menu),
    )?;
    registry.declare(
        CommandDeclaration::new("/bonjour", "bonjour")
            .description("Personal greeting with name and age")
            .arg("name", ArgType::Str)
            .arg("age", ArgType::Int)
            .ask("What is your name?")
            .ask("How old are you?")
            .menu(menu),
    )?;
    registry.declare(
        CommandDeclaration::new("/bye", "bye")
            .description("Simple farewell without arguments")
            .menu(menu),
    )?;
    Ok(())
}
