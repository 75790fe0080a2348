//! Error and report types for rule execution.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::command::InvokeError;
use crate::expand::ExpandError;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("no rule named '{rule}' in {unit}")]
  NoSuchRule { rule: String, unit: String },

  #[error("no default rule in {unit}")]
  NoDefaultRule { unit: String },

  /// A dependency has no producer rule and does not exist on disk.
  #[error("don't know how to build '{}' required by rule '{rule}' in {unit}", path.display())]
  UnbuildableDependency { path: PathBuf, rule: String, unit: String },

  #[error("rule '{rule}': {source}")]
  Expand {
    rule: String,
    #[source]
    source: ExpandError,
  },

  #[error("rule '{rule}': variable '{name}' is not a command")]
  NotACommand { name: String, rule: String },

  #[error("rule '{rule}': {source}")]
  Invoke {
    rule: String,
    #[source]
    source: InvokeError,
  },

  /// A script action raised a Lua error.
  #[error("rule '{rule}' action failed: {message}")]
  Action { rule: String, message: String },

  #[error("failed to write output: {0}")]
  Output(#[from] std::io::Error),
}

/// What happened during one `execute_*` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
  /// Rules whose action ran, in execution order.
  pub executed: Vec<String>,
  /// Rules found up to date, in visit order.
  pub up_to_date: Vec<String>,
}

impl BuildReport {
  /// Whether `rule` was visited in this run.
  pub fn contains(&self, rule: &str) -> bool {
    self.executed.iter().any(|r| r == rule) || self.up_to_date.iter().any(|r| r == rule)
  }
}
