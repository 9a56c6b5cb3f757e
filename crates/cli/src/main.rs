mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use distpack_lib::consts::CONFIG_FILENAME;

use crate::cmd::{cmd_build, cmd_clean, cmd_resolve, cmd_verify};
use crate::output::OutputFormat;

/// distpack - Reproducible repackaging of upstream distribution archives
#[derive(Parser)]
#[command(name = "distpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file
  #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
  config: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve, compose, archive and checksum the distribution
  Build {
    /// Execute every stage even if its inputs are unchanged
    #[arg(long)]
    rerun: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print the version a build would select, without downloading it
  Resolve {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Check built archives against their checksum files
  Verify {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Remove the output directory
  Clean,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { rerun, output } => cmd_build(&cli.config, rerun, output),
    Commands::Resolve { output } => cmd_resolve(&cli.config, output),
    Commands::Verify { output } => cmd_verify(&cli.config, output),
    Commands::Clean => cmd_clean(&cli.config),
  }
}
