//! Handler capability interface: a handler exposes named actions, looked up by name at dispatch time.
//!
//! Arguments reach an action already converted ([`ArgValue`]) and bound by name ([`ActionArgs`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::HandlerError;
use crate::types::OutboundMessage;

/// User-supplied conversion: the raw argument in, a value or a reason out.
pub type Converter = Arc<dyn Fn(&str) -> Result<ArgValue, String> + Send + Sync>;

/// Conversion applied to a raw argument string.
///
/// `Str` is the identity conversion. `Custom` runs a caller-provided function and is reported
/// under `name` in error text.
#[derive(Clone, Default)]
pub enum ArgType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Custom {
        name: &'static str,
        convert: Converter,
    },
}

/// A raw string that does not convert to the requested [`ArgType`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {expected}")]
pub struct ConversionError {
    pub value: String,
    pub expected: ArgType,
}

impl ArgType {
    /// Conversion backed by `convert`, reported as `name`.
    ///
    /// ```
    /// use dbot_core::{ArgType, ArgValue};
    ///
    /// let even = ArgType::custom("even number", |raw| match raw.parse::<i64>() {
    ///     Ok(n) if n % 2 == 0 => Ok(ArgValue::Int(n)),
    ///     _ => Err(format!("{} is not even", raw)),
    /// });
    /// assert_eq!(even.convert("4"), Ok(ArgValue::Int(4)));
    /// assert_eq!(even.convert("3").unwrap_err().to_string(), "'3' is not a valid even number");
    /// ```
    pub fn custom<F>(name: &'static str, convert: F) -> Self
    where
        F: Fn(&str) -> Result<ArgValue, String> + Send + Sync + 'static,
    {
        ArgType::Custom {
            name,
            convert: Arc::new(convert),
        }
    }

    /// Name used in user-facing error text.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgType::Str => "str",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Bool => "bool",
            ArgType::Custom { name, .. } => name,
        }
    }

    pub fn convert(&self, raw: &str) -> Result<ArgValue, ConversionError> {
        let fail = || ConversionError {
            value: raw.to_string(),
            expected: self.clone(),
        };
        match self {
            ArgType::Str => Ok(ArgValue::Str(raw.to_string())),
            ArgType::Int => raw.trim().parse().map(ArgValue::Int).map_err(|_| fail()),
            ArgType::Float => raw.trim().parse().map(ArgValue::Float).map_err(|_| fail()),
            ArgType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Ok(ArgValue::Bool(true)),
                "false" | "no" | "n" | "0" | "off" => Ok(ArgValue::Bool(false)),
                _ => Err(fail()),
            },
            ArgType::Custom { name, convert } => convert(raw).map_err(|reason| {
                tracing::debug!(value = raw, expected = *name, %reason, "custom conversion rejected");
                fail()
            }),
        }
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Str => f.write_str("Str"),
            ArgType::Int => f.write_str("Int"),
            ArgType::Float => f.write_str("Float"),
            ArgType::Bool => f.write_str("Bool"),
            ArgType::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

// Custom conversions compare by name.
impl PartialEq for ArgType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgType::Custom { name: a, .. }, ArgType::Custom { name: b, .. }) => a == b,
            (ArgType::Custom { .. }, _) | (_, ArgType::Custom { .. }) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for ArgType {}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A converted argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ArgValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Str(_) => ArgType::Str.type_name(),
            ArgValue::Int(_) => ArgType::Int.type_name(),
            ArgValue::Float(_) => ArgType::Float.type_name(),
            ArgValue::Bool(_) => ArgType::Bool.type_name(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Converted arguments bound by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs {
    values: Vec<(String, ArgValue)>,
}

impl ActionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn str(&self, name: &str) -> Result<&str, HandlerError> {
        match self.require(name)? {
            ArgValue::Str(s) => Ok(s),
            other => Err(wrong_type(name, ArgType::Str, other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, HandlerError> {
        match self.require(name)? {
            ArgValue::Int(i) => Ok(*i),
            other => Err(wrong_type(name, ArgType::Int, other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, HandlerError> {
        match self.require(name)? {
            ArgValue::Float(x) => Ok(*x),
            ArgValue::Int(i) => Ok(*i as f64),
            other => Err(wrong_type(name, ArgType::Float, other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, HandlerError> {
        match self.require(name)? {
            ArgValue::Bool(b) => Ok(*b),
            other => Err(wrong_type(name, ArgType::Bool, other)),
        }
    }

    fn require(&self, name: &str) -> Result<&ArgValue, HandlerError> {
        self.get(name)
            .ok_or_else(|| HandlerError::MissingArgument(name.to_string()))
    }
}

fn wrong_type(name: &str, expected: ArgType, actual: &ArgValue) -> HandlerError {
    HandlerError::WrongArgumentType {
        name: name.to_string(),
        expected: expected.type_name(),
        actual: actual.type_name(),
    }
}

/// What an action returns: a message body, `None` for "no response", or its own failure.
pub type ActionResult = Result<Option<OutboundMessage>, HandlerError>;

/// A callable action borrowed from its handler for the duration of one invocation.
pub type Action<'a> = Box<dyn Fn(&ActionArgs) -> ActionResult + Send + Sync + 'a>;

/// Something that exposes callable actions by name. Nothing else is required of a handler.
pub trait CommandHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Returns the action called `action`, if this handler has one.
    fn get_action(&self, action: &str) -> Option<Action<'_>>;

    fn has_action(&self, action: &str) -> bool {
        self.get_action(action).is_some()
    }
}

type SharedAction = Arc<dyn Fn(&ActionArgs) -> ActionResult + Send + Sync>;

/// Handler built from closures, for handlers that need no state of their own.
///
/// ```
/// use dbot_core::{ActionTable, CommandHandler, OutboundMessage};
///
/// let handler = ActionTable::new("ByeHandler")
///     .action("bye", |_args| Ok(Some(OutboundMessage::text("Bye!"))));
/// assert!(handler.has_action("bye"));
/// ```
#[derive(Clone)]
pub struct ActionTable {
    name: String,
    actions: HashMap<String, SharedAction>,
}

impl ActionTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    /// Adds (or replaces) an action.
    pub fn action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ActionArgs) -> ActionResult + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(f));
        self
    }
}

impl CommandHandler for ActionTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_action(&self, action: &str) -> Option<Action<'_>> {
        let f = self.actions.get(action)?.clone();
        Some(Box::new(move |args: &ActionArgs| f(args)))
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionTable")
            .field("name", &self.name)
            .field("actions", &names)
            .finish()
    }
}
