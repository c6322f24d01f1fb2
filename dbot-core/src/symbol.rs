//! Dynamic enumeration: a string-keyed table of immutable symbols.
//!
//! Command and menu identifiers are only fully known once user code declares them, yet the
//! dispatcher must look up (or fabricate) a symbol for any inbound string. [`SymbolTable`]
//! gives both: [`SymbolTable::register`] seeds named members once, [`SymbolTable::resolve`]
//! returns the existing symbol or creates one on the fly.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Which identifier space a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Command,
    Menu,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Command => f.write_str("Command"),
            SymbolKind::Menu => f.write_str("Menu"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(SymbolKind),
}

#[derive(Debug)]
struct SymbolInner {
    kind: SymbolKind,
    name: String,
    value: String,
}

/// Immutable symbol (e.g. `Command.BONJOUR` for `/bonjour`). Cheap to clone.
///
/// Equality and hashing use the kind and the identifier string only; the display name
/// does not participate.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

impl Symbol {
    fn new(kind: SymbolKind, name: String, value: String) -> Self {
        Self(Arc::new(SymbolInner { kind, name, value }))
    }

    pub fn kind(&self) -> SymbolKind {
        self.0.kind
    }

    /// Member name, e.g. `BONJOUR`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Identifier string, e.g. `/bonjour`.
    pub fn value(&self) -> &str {
        &self.0.value
    }

    /// Button label: the member name with only its first letter upper-cased (`BONJOUR` -> `Bonjour`).
    pub fn label(&self) -> String {
        let lower = self.0.name.to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind == other.0.kind && self.0.value == other.0.value
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.kind.hash(state);
        self.0.value.hash(state);
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.0.value == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0.value == *other
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}: '{}'>", self.0.kind, self.0.name, self.0.value)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.value)
    }
}

/// Derives a member name from an identifier: strip leading `/`, upper-case (`/bonjour` -> `BONJOUR`).
pub fn derive_name(value: &str) -> String {
    value.trim_start_matches('/').to_uppercase()
}

#[derive(Default)]
struct Members {
    ordered: Vec<Symbol>,
    by_value: HashMap<String, Symbol>,
}

impl Members {
    fn insert(&mut self, symbol: Symbol) {
        self.by_value
            .insert(symbol.value().to_string(), symbol.clone());
        self.ordered.push(symbol);
    }
}

/// Lazily-extensible table of [`Symbol`]s for one [`SymbolKind`].
pub struct SymbolTable {
    kind: SymbolKind,
    members: RwLock<Members>,
}

impl SymbolTable {
    pub fn new(kind: SymbolKind) -> Self {
        Self {
            kind,
            members: RwLock::new(Members::default()),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Seeds named members. First writer wins: once the table holds any member this is a no-op.
    /// Returns whether the items were applied.
    pub fn register<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut members = self.write();
        if !members.ordered.is_empty() {
            tracing::debug!(kind = %self.kind, "symbol table already populated, register ignored");
            return false;
        }
        for (name, value) in items {
            if value.is_empty() || members.by_value.contains_key(value) {
                continue;
            }
            members.insert(Symbol::new(self.kind, name.to_string(), value.to_string()));
        }
        true
    }

    /// Returns the symbol for `value`, creating and registering it if unknown.
    /// Fails only for an empty identifier.
    pub fn resolve(&self, value: &str) -> Result<Symbol, SymbolError> {
        if value.is_empty() {
            return Err(SymbolError::EmptyIdentifier(self.kind));
        }
        if let Some(existing) = self.get(value) {
            return Ok(existing);
        }
        let mut members = self.write();
        // Another writer may have inserted between the read and write lock.
        if let Some(existing) = members.by_value.get(value) {
            return Ok(existing.clone());
        }
        let symbol = Symbol::new(self.kind, derive_name(value), value.to_string());
        tracing::debug!(kind = %self.kind, symbol = ?symbol, "symbol created on resolve");
        members.insert(symbol.clone());
        Ok(symbol)
    }

    /// Returns the symbol for `value` without creating it.
    pub fn get(&self, value: &str) -> Option<Symbol> {
        self.read().by_value.get(value).cloned()
    }

    /// Every registered symbol in registration order.
    pub fn list_all(&self) -> Vec<Symbol> {
        self.read().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Members> {
        self.members.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Members> {
        self.members.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
