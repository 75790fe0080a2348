//! Implementation of building a rule.
//!
//! Loads the rule file, then brings the requested rule (or the default rule)
//! up to date, running commands in the work directory.

use std::io::IsTerminal;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use pake_lib::build::Orchestrator;
use pake_lib::command::ProcessRunner;
use pake_lib::console::Console;
use pake_lib::session::BuildSession;

use crate::output::{format_duration, print_success};

/// Build `rule` from the rule file at `file`, or its default rule.
///
/// Relative targets and dependencies resolve against `directory`, which is
/// also where commands run; it defaults to the current directory.
pub fn cmd_build(file: &Path, rule: Option<&str>, directory: Option<&Path>, color: bool) -> Result<()> {
  let start = Instant::now();

  let work_dir = match directory {
    Some(dir) => dunce::canonicalize(dir).with_context(|| format!("Invalid directory: {}", dir.display()))?,
    None => std::env::current_dir().context("Failed to determine current directory")?,
  };
  if !work_dir.is_dir() {
    bail!("Not a directory: {}", work_dir.display());
  }

  let mut session = BuildSession::new();
  let unit = session
    .load(file)
    .with_context(|| format!("Failed to load rule file: {}", file.display()))?;

  let color = color && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
  let runner = Rc::new(ProcessRunner::new().with_cwd(&work_dir));
  let console = Rc::new(Console::stdout(color));
  let orchestrator = Orchestrator::new(unit, runner, console).with_work_dir(&work_dir);

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let report = rt
    .block_on(async {
      match rule {
        Some(name) => orchestrator.execute_rule(name).await,
        None => orchestrator.execute_default().await,
      }
    })
    .context("Build failed")?;

  info!(work_dir = %work_dir.display(), "build complete");

  if !report.executed.is_empty() {
    print_success(&format!(
      "{} rule(s) run, {} up to date in {}",
      report.executed.len(),
      report.up_to_date.len(),
      format_duration(start.elapsed())
    ));
  }

  Ok(())
}
