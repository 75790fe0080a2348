//! Listing the rules of a rule file.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use pake_lib::session::BuildSession;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_list(file: &Path, format: OutputFormat) -> Result<()> {
  let mut session = BuildSession::new();
  let unit = session
    .load(file)
    .with_context(|| format!("Failed to load rule file: {}", file.display()))?;
  let rules = unit.graph().summaries(unit.vars());

  if format.is_json() {
    let json_output = serde_json::json!({ "unit": unit.name(), "rules": rules });
    return print_json(&json_output);
  }

  if rules.is_empty() {
    print_info(&format!("No rules declared in {}", unit.name()));
    return Ok(());
  }

  for rule in &rules {
    let default = if rule.default { " (default)" } else { "" };
    println!(
      "{} {}{}",
      symbols::INFO,
      rule.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      default
    );
    if !rule.targets.is_empty() {
      print_stat("targets", &rule.targets.join(", "));
    }
    if !rule.dependencies.is_empty() {
      print_stat(
        "dependencies",
        &format!("{} {}", symbols::ARROW, rule.dependencies.join(", ")),
      );
    }
    print_stat("action", rule.action);
  }

  Ok(())
}
