//! Rule execution.
//!
//! The [`Orchestrator`] brings a rule of a loaded [`Unit`] up to date:
//! dependencies first, skipping rules whose targets are newer than their
//! dependencies, and failing early when a dependency can neither be built nor
//! found on disk.
//!
//! Execution is sequential. Each rule is visited at most once per
//! `execute_*` call, so a producer shared by several rules runs once.

pub mod staleness;
pub mod types;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info};

use crate::command::{self, CommandRunner};
use crate::console::Console;
use crate::expand::{self, ExpandError};
use crate::lua::action::{self as lua_action, ActionEnv};
use crate::rule::{Action, Rule, Step};
use crate::session::Unit;
use crate::vars::Value;

pub use types::{BuildError, BuildReport};

pub struct Orchestrator<'u> {
  unit: &'u Unit,
  runner: Rc<dyn CommandRunner>,
  console: Rc<Console>,
  work_dir: PathBuf,
}

impl<'u> Orchestrator<'u> {
  /// Create an orchestrator resolving paths against the current directory.
  pub fn new(unit: &'u Unit, runner: Rc<dyn CommandRunner>, console: Rc<Console>) -> Self {
    Self {
      unit,
      runner,
      console,
      work_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
  }

  /// Resolve relative targets and dependencies against `dir`.
  pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.work_dir = dir.into();
    self
  }

  pub fn work_dir(&self) -> &Path {
    &self.work_dir
  }

  /// Bring the rule named `name` up to date.
  pub async fn execute_rule(&self, name: &str) -> Result<BuildReport, BuildError> {
    let mut report = BuildReport::default();
    self.visit(name, &mut report).await?;
    info!(
      rule = %name,
      executed = report.executed.len(),
      up_to_date = report.up_to_date.len(),
      "build finished"
    );
    Ok(report)
  }

  /// Bring the unit's default rule up to date.
  pub async fn execute_default(&self) -> Result<BuildReport, BuildError> {
    let rule = self.unit.graph().default_rule().ok_or_else(|| BuildError::NoDefaultRule {
      unit: self.unit.name().to_string(),
    })?;
    self.execute_rule(&rule.name).await
  }

  async fn visit(&self, name: &str, report: &mut BuildReport) -> Result<(), BuildError> {
    if report.contains(name) {
      debug!(rule = %name, "already visited");
      return Ok(());
    }

    let rule = self.unit.graph().by_name(name).ok_or_else(|| BuildError::NoSuchRule {
      rule: name.to_string(),
      unit: self.unit.name().to_string(),
    })?;

    if rule.dependencies.is_empty() {
      self.run_action(rule).await?;
      report.executed.push(rule.name.clone());
      return Ok(());
    }

    let dependencies = self.expand_all(rule, &rule.dependencies)?;
    let targets = self.expand_all(rule, &rule.targets)?;
    let dependency_paths: Vec<PathBuf> = dependencies.iter().map(|d| self.resolve(d)).collect();
    let target_paths: Vec<PathBuf> = targets.iter().map(|t| self.resolve(t)).collect();

    if staleness::is_up_to_date(&target_paths, &dependency_paths).await {
      info!(rule = %rule.name, "up to date");
      self.console.notice(&format!(
        "Nothing to do for '{}' in '{}'.",
        dependencies.join(", "),
        self.unit.name()
      ))?;
      report.up_to_date.push(rule.name.clone());
      return Ok(());
    }

    // Classify every dependency before building any of them.
    let mut producers: Vec<&Rule> = Vec::new();
    for (dependency, path) in dependencies.iter().zip(&dependency_paths) {
      let producer = self
        .unit
        .graph()
        .find_producer(dependency, self.unit.vars())
        .map_err(|source| self.expand_error(rule, source))?;

      match producer {
        Some(producer) => producers.push(producer),
        None if tokio::fs::try_exists(path).await.unwrap_or(false) => {
          debug!(rule = %rule.name, dependency = %dependency, "source file");
        }
        None => {
          return Err(BuildError::UnbuildableDependency {
            path: PathBuf::from(dependency),
            rule: rule.name.clone(),
            unit: self.unit.name().to_string(),
          });
        }
      }
    }

    for producer in producers {
      Box::pin(self.visit(&producer.name, report)).await?;
    }

    self.run_action(rule).await?;
    report.executed.push(rule.name.clone());
    Ok(())
  }

  async fn run_action(&self, rule: &Rule) -> Result<(), BuildError> {
    info!(rule = %rule.name, "running rule");

    match &rule.action {
      Action::None => Ok(()),
      Action::Steps(steps) => {
        for step in steps {
          self.run_step(rule, step).await?;
        }
        Ok(())
      }
      Action::Script(function) => self.run_script(rule, function).await,
    }
  }

  async fn run_step(&self, rule: &Rule, step: &Step) -> Result<(), BuildError> {
    let command = match self.unit.vars().get(&step.command) {
      Some(Value::Command(command)) => command,
      Some(Value::Literal(_)) => {
        return Err(BuildError::NotACommand {
          name: step.command.clone(),
          rule: rule.name.clone(),
        });
      }
      None => {
        return Err(self.expand_error(
          rule,
          ExpandError::UnresolvedReference {
            name: step.command.clone(),
          },
        ));
      }
    };

    command::invoke(
      command,
      &step.args,
      self.unit.vars(),
      self.runner.as_ref(),
      &self.console,
    )
    .await
    .map_err(|source| BuildError::Invoke {
      rule: rule.name.clone(),
      source,
    })?;
    Ok(())
  }

  async fn run_script(&self, rule: &Rule, function: &mlua::Function) -> Result<(), BuildError> {
    let action_error = |message: String| BuildError::Action {
      rule: rule.name.clone(),
      message,
    };

    let lua = self
      .unit
      .lua()
      .ok_or_else(|| action_error("unit has no Lua state".to_string()))?;

    let targets = self.expand_all(rule, &rule.targets)?;
    let dependencies = self.expand_all(rule, &rule.dependencies)?;
    let ctx =
      lua_action::rule_context(lua, &rule.name, &targets, &dependencies).map_err(|e| action_error(e.to_string()))?;

    lua_action::install_action_env(
      lua,
      ActionEnv {
        vars: self.unit.shared_vars(),
        runner: self.runner.clone(),
        console: self.console.clone(),
      },
    );
    let result = function.call_async::<()>(ctx).await;
    lua.remove_app_data::<ActionEnv>();

    result.map_err(|e| action_error(e.to_string()))
  }

  fn expand_all(&self, rule: &Rule, exprs: &[String]) -> Result<Vec<String>, BuildError> {
    exprs
      .iter()
      .map(|expr| expand::evaluate(expr, self.unit.vars()).map_err(|source| self.expand_error(rule, source)))
      .collect()
  }

  fn expand_error(&self, rule: &Rule, source: ExpandError) -> BuildError {
    BuildError::Expand {
      rule: rule.name.clone(),
      source,
    }
  }

  fn resolve(&self, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.work_dir.join(path)
    }
  }
}
