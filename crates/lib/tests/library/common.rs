//! Shared helpers for library tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pake_lib::build::Orchestrator;
use pake_lib::command::{CommandOutput, CommandRunner, RunFuture, RunnerError};
use pake_lib::console::{Console, SharedBuffer};
use pake_lib::session::Unit;
use tempfile::TempDir;

/// Records every invocation and emulates `cc`, `touch`, `cp` and `cat` inside
/// a project directory, so rule files can be exercised without real tools.
pub struct FakeTools {
  root: PathBuf,
  calls: RefCell<Vec<String>>,
}

impl FakeTools {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      calls: RefCell::new(Vec::new()),
    }
  }

  /// Invocations as `program arg1 arg2`.
  pub fn calls(&self) -> Vec<String> {
    self.calls.borrow().clone()
  }

  fn emulate(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
    let mut output = CommandOutput {
      code: Some(0),
      ..Default::default()
    };

    match program {
      "cc" => {
        if let Some(i) = args.iter().position(|a| a == "-o")
          && let Some(out) = args.get(i + 1)
        {
          std::fs::write(self.root.join(out), b"binary")?;
        }
      }
      "touch" => {
        for arg in args {
          std::fs::write(self.root.join(arg), b"")?;
        }
      }
      "cp" if args.len() == 2 => {
        std::fs::copy(self.root.join(&args[0]), self.root.join(&args[1]))?;
      }
      "cat" => {
        for arg in args {
          output.stdout.extend(std::fs::read(self.root.join(arg))?);
        }
      }
      _ => {}
    }

    Ok(output)
  }
}

impl CommandRunner for FakeTools {
  fn run<'a>(&'a self, program: &'a str, args: &'a [String]) -> RunFuture<'a> {
    Box::pin(async move {
      let mut line = program.to_string();
      for arg in args {
        line.push(' ');
        line.push_str(arg);
      }
      self.calls.borrow_mut().push(line);

      if program.starts_with("missing") {
        return Err(RunnerError::NotFound {
          program: program.to_string(),
        });
      }

      self.emulate(program, args).map_err(|source| RunnerError::Io {
        program: program.to_string(),
        source,
      })
    })
  }
}

/// A temp project with a rule file, fake tools and a captured console.
pub struct Project {
  pub temp: TempDir,
  pub tools: Rc<FakeTools>,
  pub console: Rc<Console>,
  pub output: SharedBuffer,
}

impl Project {
  pub fn new(rules: &str) -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("Pakefile.lua"), rules).unwrap();
    let tools = Rc::new(FakeTools::new(temp.path()));
    let (console, output) = Console::buffered();
    Self {
      temp,
      tools,
      console: Rc::new(console),
      output,
    }
  }

  pub fn rule_file(&self) -> PathBuf {
    self.temp.path().join("Pakefile.lua")
  }

  pub fn write(&self, name: &str, content: &str) {
    std::fs::write(self.temp.path().join(name), content).unwrap();
  }

  pub fn exists(&self, name: &str) -> bool {
    self.temp.path().join(name).exists()
  }

  pub fn orchestrator<'u>(&self, unit: &'u Unit) -> Orchestrator<'u> {
    Orchestrator::new(unit, self.tools.clone(), self.console.clone()).with_work_dir(self.temp.path())
  }
}
