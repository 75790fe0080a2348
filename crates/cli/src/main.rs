mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, describe, print_error};

/// pake - a minimal declarative build orchestrator
#[derive(Parser)]
#[command(name = "pake")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Rule file to load (e.g. Pakefile.lua)
  file: PathBuf,

  /// Rule to build (default: the rule declared with `default = true`)
  rule: Option<String>,

  /// List the rules of the file instead of building
  #[arg(short, long)]
  list: bool,

  /// Output format for --list
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Resolve paths and run commands in DIR
  #[arg(short = 'C', long, value_name = "DIR")]
  directory: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,

  /// Disable colored output
  #[arg(long)]
  no_color: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  // Initialize logging
  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if cli.no_color {
    owo_colors::set_override(false);
  }

  let result = if cli.list {
    cmd::cmd_list(&cli.file, cli.format)
  } else {
    cmd::cmd_build(
      &cli.file,
      cli.rule.as_deref(),
      cli.directory.as_deref(),
      !cli.no_color,
    )
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&describe(&err));
      ExitCode::FAILURE
    }
  }
}
