//! Command bindings and external program execution.
//!
//! Actions run external programs through a [`CommandRunner`]. [`invoke`] ties a
//! unit's command binding to a runner: it expands the binding's base arguments
//! and the call-site arguments, splits them into words and runs the program,
//! reporting the captured output to the run's [`Console`].
//!
//! A missing executable is a warning, not a failure, and a non-zero exit code
//! is not treated as a failure either. Only other spawn errors abort the run.

pub mod process;
pub mod split;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::expand::{self, ExpandError};
use crate::vars::{CommandDef, VariableStore};

pub use process::ProcessRunner;
pub use split::{SplitError, split};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
  /// Exit code, `None` when terminated by a signal.
  pub code: Option<i32>,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Errors reported by a [`CommandRunner`].
#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("command '{program}' not found")]
  NotFound { program: String },

  #[error("failed to run '{program}': {source}")]
  Io {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// Errors that abort a command invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error(transparent)]
  Expand(#[from] ExpandError),

  #[error("invalid arguments: {0}")]
  Split(#[from] SplitError),

  #[error(transparent)]
  Runner(#[from] RunnerError),

  #[error("failed to write command output: {0}")]
  Output(#[from] std::io::Error),
}

/// Outcome of an invocation that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
  Completed(CommandOutput),
  /// The executable does not exist; a warning was reported.
  NotFound,
}

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<CommandOutput, RunnerError>> + 'a>>;

/// Executes a single external program invocation.
pub trait CommandRunner {
  fn run<'a>(&'a self, program: &'a str, args: &'a [String]) -> RunFuture<'a>;
}

/// Invoke a command binding with call-site arguments.
///
/// The program name, the base arguments and `call_args` are expanded against
/// `vars`; base arguments come first.
pub async fn invoke(
  command: &CommandDef,
  call_args: &str,
  vars: &VariableStore,
  runner: &dyn CommandRunner,
  console: &Console,
) -> Result<Invocation, InvokeError> {
  let program = expand::evaluate(&command.program, vars)?;
  let mut args = split(&expand::evaluate(&command.base_args, vars)?)?;
  args.extend(split(&expand::evaluate(call_args, vars)?)?);

  run_program(&program, &args, runner, console).await
}

/// Run an already expanded program and report its output.
pub async fn run_program(
  program: &str,
  args: &[String],
  runner: &dyn CommandRunner,
  console: &Console,
) -> Result<Invocation, InvokeError> {
  info!(program = %program, args = ?args, "running command");

  match runner.run(program, args).await {
    Ok(output) => {
      console.write_stdout(&output.stdout)?;
      console.write_stderr(&output.stderr)?;

      if !output.success() {
        debug!(program = %program, code = ?output.code, "command exited unsuccessfully");
      }

      Ok(Invocation::Completed(output))
    }
    Err(RunnerError::NotFound { program }) => {
      warn!(program = %program, "command not found");
      console.warning(&format!("command '{program}' not found"))?;
      Ok(Invocation::NotFound)
    }
    Err(e) => Err(e.into()),
  }
}
