//! Output stream of a build run.
//!
//! Command stdout is written verbatim, command stderr is written to the same
//! stream with a marker (bright red when color is enabled, a `[stderr]` line
//! prefix otherwise), and orchestrator notices are framed with `***`.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use owo_colors::OwoColorize;

/// Prefix for stderr lines when color is disabled.
const STDERR_PREFIX: &str = "[stderr] ";

/// In-memory sink that can be shared with a [`Console`] and read back later.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.borrow()).into_owned()
  }
}

impl Write for SharedBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

pub struct Console {
  sink: RefCell<Box<dyn Write>>,
  color: bool,
}

impl Console {
  pub fn new(sink: impl Write + 'static, color: bool) -> Self {
    Self {
      sink: RefCell::new(Box::new(sink)),
      color,
    }
  }

  /// Console writing to the process stdout.
  pub fn stdout(color: bool) -> Self {
    Self::new(io::stdout(), color)
  }

  /// Console writing to a fresh [`SharedBuffer`], without color.
  pub fn buffered() -> (Self, SharedBuffer) {
    let buffer = SharedBuffer::new();
    (Self::new(buffer.clone(), false), buffer)
  }

  pub fn color(&self) -> bool {
    self.color
  }

  /// Write captured command stdout.
  pub fn write_stdout(&self, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
      return Ok(());
    }
    let mut sink = self.sink.borrow_mut();
    sink.write_all(bytes)?;
    sink.flush()
  }

  /// Write captured command stderr with the stderr marker.
  pub fn write_stderr(&self, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
      return Ok(());
    }
    let text = String::from_utf8_lossy(bytes);
    let mut sink = self.sink.borrow_mut();

    if self.color {
      write!(sink, "{}", text.bright_red())?;
    } else {
      for line in text.split_inclusive('\n') {
        write!(sink, "{STDERR_PREFIX}{line}")?;
      }
    }
    sink.flush()
  }

  /// Write an orchestrator notice, e.g. `*** Nothing to do for 'hello.c'. ***`.
  pub fn notice(&self, message: &str) -> io::Result<()> {
    let mut sink = self.sink.borrow_mut();
    writeln!(sink, "*** {message} ***")?;
    sink.flush()
  }

  pub fn warning(&self, message: &str) -> io::Result<()> {
    let mut sink = self.sink.borrow_mut();
    if self.color {
      writeln!(sink, "{} {}", "warning:".yellow().bold(), message)?;
    } else {
      writeln!(sink, "warning: {message}")?;
    }
    sink.flush()
  }
}

impl std::fmt::Debug for Console {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Console").field("color", &self.color).finish_non_exhaustive()
  }
}
