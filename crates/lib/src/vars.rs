//! Variable store for a loaded rule file.
//!
//! A unit's variables are either literal strings or command bindings. The store
//! is populated while a rule file loads and is read-only for the rest of the run.

use std::collections::BTreeMap;

/// A command binding: a program plus an unevaluated base argument string.
///
/// `base_args` may reference other variables; it is expanded at use time so
/// variables can be declared after the command that mentions them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDef {
  pub program: String,
  pub base_args: String,
}

impl CommandDef {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      base_args: String::new(),
    }
  }

  pub fn with_base_args(mut self, base_args: impl Into<String>) -> Self {
    self.base_args = base_args.into();
    self
  }

  /// The textual command line this binding stands for in an expression.
  pub fn command_line(&self) -> String {
    if self.base_args.is_empty() {
      self.program.clone()
    } else {
      format!("{} {}", self.program, self.base_args)
    }
  }
}

/// The value bound to a variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Literal(String),
  Command(CommandDef),
}

impl Value {
  /// Text substituted for a `$(NAME)` reference to this value.
  pub fn expansion(&self) -> String {
    match self {
      Value::Literal(s) => s.clone(),
      Value::Command(cmd) => cmd.command_line(),
    }
  }

  pub fn as_command(&self) -> Option<&CommandDef> {
    match self {
      Value::Command(cmd) => Some(cmd),
      Value::Literal(_) => None,
    }
  }
}

/// Named variables visible to one unit.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
  vars: BTreeMap<String, Value>,
}

impl VariableStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bind `name`, replacing any previous binding.
  pub fn set(&mut self, name: impl Into<String>, value: Value) {
    self.vars.insert(name.into(), value);
  }

  pub fn set_literal(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.set(name, Value::Literal(value.into()));
  }

  pub fn set_command(&mut self, name: impl Into<String>, command: CommandDef) {
    self.set(name, Value::Command(command));
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.vars.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.vars.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Iterate bindings sorted by name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v))
  }
}
