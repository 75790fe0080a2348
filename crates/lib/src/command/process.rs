//! Child process runner.
//!
//! Runs programs directly (no shell) with the caller's environment, capturing
//! stdout and stderr.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use super::{CommandOutput, CommandRunner, RunFuture, RunnerError};

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
  cwd: Option<PathBuf>,
}

impl ProcessRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run every program in `dir` instead of the current directory.
  pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn cwd(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }
}

impl CommandRunner for ProcessRunner {
  fn run<'a>(&'a self, program: &'a str, args: &'a [String]) -> RunFuture<'a> {
    Box::pin(async move {
      let mut command = Command::new(program);
      command.args(args);
      if let Some(dir) = &self.cwd {
        command.current_dir(dir);
      }

      debug!(program = %program, working_dir = ?self.cwd, "spawning process");

      let output = command.output().await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
          RunnerError::NotFound {
            program: program.to_string(),
          }
        } else {
          RunnerError::Io {
            program: program.to_string(),
            source,
          }
        }
      })?;

      Ok(CommandOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        code: output.status.code(),
      })
    })
  }
}
