//! Process-wide command table: declarations keyed by identifier, plus the command and menu symbol tables.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dbot_core::{ArgType, Symbol, SymbolError, SymbolKind, SymbolTable};
use tracing::{debug, info, warn};

use crate::error::DeclareError;

/// Longest identifier accepted: the identifier doubles as inline-button callback data (64 bytes).
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Builder passed to [`CommandRegistry::declare`].
///
/// ```
/// use command_registry::{CommandDeclaration, CommandRegistry};
/// use dbot_core::ArgType;
///
/// let registry = CommandRegistry::new();
/// registry
///     .declare(
///         CommandDeclaration::new("/bonjour", "bonjour")
///             .description("Personal greeting")
///             .arg("name", ArgType::Str)
///             .arg("age", ArgType::Int)
///             .ask("What is your name?")
///             .ask("How old are you?")
///             .menu("/menu"),
///     )
///     .unwrap();
/// assert_eq!(registry.lookup("/bonjour").unwrap().arg_names, vec!["name", "age"]);
/// ```
#[derive(Debug, Clone)]
pub struct CommandDeclaration {
    identifier: String,
    action: String,
    description: String,
    args: Vec<(String, ArgType)>,
    prompts: Vec<String>,
    menu: Option<String>,
}

impl CommandDeclaration {
    /// `identifier` is the command token (e.g. `/bye`); `action` is the name handlers expose it under.
    pub fn new(identifier: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action: action.into(),
            description: String::new(),
            args: Vec::new(),
            prompts: Vec::new(),
            menu: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends an expected argument; order of calls is the positional order.
    pub fn arg(mut self, name: impl Into<String>, arg_type: ArgType) -> Self {
        self.args.push((name.into(), arg_type));
        self
    }

    /// Appends a prompt question, asked when the argument at the same position is missing.
    pub fn ask(mut self, question: impl Into<String>) -> Self {
        self.prompts.push(question.into());
        self
    }

    pub fn menu(mut self, menu: impl Into<String>) -> Self {
        self.menu = Some(menu.into());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn validate(&self) -> Result<(), DeclareError> {
        if self.identifier.is_empty() {
            return Err(DeclareError::EmptyIdentifier);
        }
        if self.identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(DeclareError::IdentifierTooLong {
                identifier: self.identifier.clone(),
                len: self.identifier.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        if self.action.is_empty() {
            return Err(DeclareError::EmptyAction(self.identifier.clone()));
        }
        let mut seen = HashSet::new();
        for (name, _) in &self.args {
            if !seen.insert(name.as_str()) {
                return Err(DeclareError::DuplicateArgument {
                    identifier: self.identifier.clone(),
                    argument: name.clone(),
                });
            }
        }
        if !self.prompts.is_empty() && self.prompts.len() != self.args.len() {
            return Err(DeclareError::PromptCountMismatch {
                identifier: self.identifier.clone(),
                prompts: self.prompts.len(),
                args: self.args.len(),
            });
        }
        Ok(())
    }
}

/// Declared metadata for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub command: Symbol,
    /// Name of the handler action this command runs.
    pub action: String,
    pub arg_names: Vec<String>,
    pub arg_types: HashMap<String, ArgType>,
    /// One question per argument, or empty.
    pub prompts: Vec<String>,
    pub menu: Option<Symbol>,
    pub description: String,
}

impl RegistryEntry {
    /// Conversion for `name`; [`ArgType::Str`] when not declared.
    pub fn arg_type(&self, name: &str) -> ArgType {
        self.arg_types.get(name).cloned().unwrap_or_default()
    }

    pub fn has_prompts(&self) -> bool {
        !self.prompts.is_empty()
    }

    pub fn identifier(&self) -> &str {
        self.command.value()
    }
}

#[derive(Default)]
struct Entries {
    ordered: Vec<Arc<RegistryEntry>>,
    index: HashMap<String, usize>,
}

/// Command registry. Build once at startup, share as `Arc<CommandRegistry>`.
///
/// Reads and writes are lock-protected, so a declaration made while dispatch runs never
/// corrupts readers, though declaring everything before the workers start is the intended use.
pub struct CommandRegistry {
    commands: SymbolTable,
    menus: SymbolTable,
    entries: RwLock<Entries>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: SymbolTable::new(SymbolKind::Command),
            menus: SymbolTable::new(SymbolKind::Menu),
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Stores an entry for the declaration and returns its command symbol.
    ///
    /// Redeclaring an identifier overwrites the previous entry in place (its position in
    /// [`all_entries`](Self::all_entries) is kept) and logs a warning.
    pub fn declare(&self, declaration: CommandDeclaration) -> Result<Symbol, DeclareError> {
        declaration.validate()?;

        let command = self
            .commands
            .resolve(&declaration.identifier)
            .map_err(|_| DeclareError::EmptyIdentifier)?;
        let menu = match &declaration.menu {
            Some(m) if !m.is_empty() => self.menus.resolve(m).ok(),
            _ => None,
        };

        let entry = Arc::new(RegistryEntry {
            command: command.clone(),
            action: declaration.action,
            arg_names: declaration.args.iter().map(|(n, _)| n.clone()).collect(),
            arg_types: declaration.args.into_iter().collect(),
            prompts: declaration.prompts,
            menu,
            description: declaration.description,
        });

        let mut entries = self.write();
        match entries.index.get(command.value()).copied() {
            Some(position) => {
                warn!(
                    command = %command,
                    previous_action = %entries.ordered[position].action,
                    action = %entry.action,
                    "command redeclared, overwriting previous entry"
                );
                entries.ordered[position] = entry;
            }
            None => {
                info!(
                    command = %command,
                    action = %entry.action,
                    args = ?entry.arg_names,
                    prompts = entry.prompts.len(),
                    menu = ?entry.menu,
                    "registered command"
                );
                let position = entries.ordered.len();
                entries.index.insert(command.value().to_string(), position);
                entries.ordered.push(entry);
            }
        }
        Ok(command)
    }

    pub fn lookup(&self, identifier: &str) -> Option<Arc<RegistryEntry>> {
        let entries = self.read();
        let found = entries
            .index
            .get(identifier)
            .map(|&i| entries.ordered[i].clone());
        if found.is_none() {
            debug!(identifier = %identifier, "command lookup missed");
        }
        found
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.read().index.contains_key(identifier)
    }

    /// Entries in declaration order.
    pub fn all_entries(&self) -> Vec<Arc<RegistryEntry>> {
        self.read().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Command symbol for `identifier`, created if never seen.
    pub fn resolve_command(&self, identifier: &str) -> Result<Symbol, SymbolError> {
        self.commands.resolve(identifier)
    }

    /// Menu symbol for `identifier`, created if never seen.
    pub fn resolve_menu(&self, identifier: &str) -> Result<Symbol, SymbolError> {
        self.menus.resolve(identifier)
    }

    pub fn commands(&self) -> &SymbolTable {
        &self.commands
    }

    pub fn menus(&self) -> &SymbolTable {
        &self.menus
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
