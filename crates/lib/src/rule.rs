//! Rule declarations.
//!
//! A rule is a named unit of build work: the artifacts it produces (targets),
//! the artifacts it needs (dependencies), whether it is the unit's default
//! rule, and the action that does the work. Targets and dependencies are
//! expressions that may reference unit variables.

use mlua::prelude::*;

/// One command invocation inside a declarative action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  /// Name of the command variable to invoke.
  pub command: String,
  /// Call-site argument string, expanded at run time.
  pub args: String,
}

impl Step {
  pub fn new(command: impl Into<String>, args: impl Into<String>) -> Self {
    Self {
      command: command.into(),
      args: args.into(),
    }
  }
}

/// What a rule does when it runs.
#[derive(Debug, Clone, Default)]
pub enum Action {
  #[default]
  None,
  /// Ordered command invocations.
  Steps(Vec<Step>),
  /// A Lua function from the rule file.
  Script(LuaFunction),
}

#[derive(Debug, Clone)]
pub struct Rule {
  pub name: String,
  pub targets: Vec<String>,
  pub dependencies: Vec<String>,
  pub is_default: bool,
  pub action: Action,
}

impl Rule {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      targets: Vec::new(),
      dependencies: Vec::new(),
      is_default: false,
      action: Action::None,
    }
  }

  pub fn with_target(mut self, target: impl Into<String>) -> Self {
    self.targets.push(target.into());
    self
  }

  pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
    self.dependencies.push(dependency.into());
    self
  }

  pub fn with_default(mut self, is_default: bool) -> Self {
    self.is_default = is_default;
    self
  }

  pub fn with_action(mut self, action: Action) -> Self {
    self.action = action;
    self
  }

  pub fn with_steps(self, steps: Vec<Step>) -> Self {
    self.with_action(Action::Steps(steps))
  }
}
