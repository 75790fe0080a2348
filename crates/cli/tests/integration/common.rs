//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated project directory with a `Pakefile.lua`.
pub struct TestEnv {
  pub temp: TempDir,
  pub rule_file: PathBuf,
}

impl TestEnv {
  pub fn new(rules: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let rule_file = temp.path().join("Pakefile.lua");
    std::fs::write(&rule_file, rules).unwrap();
    Self { temp, rule_file }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Move the modification time of a project file `secs` into the past.
  pub fn age(&self, relative_path: &str, secs: u64) {
    set_mtime(&self.path(relative_path), SystemTime::now() - Duration::from_secs(secs));
  }

  /// `pake <rule file> -C <project>` with color disabled.
  pub fn pake(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("pake");
    cmd
      .arg(&self.rule_file)
      .arg("-C")
      .arg(self.temp.path())
      .arg("--no-color")
      .env_remove("RUST_LOG");
    cmd
  }
}

fn set_mtime(path: &Path, mtime: SystemTime) {
  std::fs::File::options()
    .write(true)
    .open(path)
    .unwrap()
    .set_modified(mtime)
    .unwrap();
}
