mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ndkpack_lib::request::RequestError;

use crate::cmd::{BuildArgs, LintArgs, cmd_build, cmd_format, cmd_info, cmd_lint, cmd_update};
use crate::output::print_error;

/// ndkpack - build and package Android NDK modules
#[derive(Parser)]
#[command(name = "ndkpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project directory
  #[arg(long, global = true, value_name = "DIR", default_value = ".")]
  project: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the module and package it into a zip archive
  Build(BuildArgs),

  /// Format Rust and C++ sources
  Format,

  /// Run clippy for the target, debug and release
  Lint(LintArgs),

  /// Update the dependencies of every crate
  Update,

  /// Show the host platform and the resolved toolchain
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build(args) => cmd_build(&cli.project, &args, cli.verbose),
    Commands::Format => cmd_format(&cli.project, cli.verbose),
    Commands::Lint(args) => cmd_lint(&cli.project, &args),
    Commands::Update => cmd_update(&cli.project),
    Commands::Info => cmd_info(&cli.project),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      if err.downcast_ref::<RequestError>().is_some() {
        print_build_usage();
        ExitCode::from(2)
      } else {
        ExitCode::FAILURE
      }
    }
  }
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn print_build_usage() {
  let mut command = Cli::command();
  command.build();
  if let Some(build) = command.find_subcommand_mut("build") {
    eprintln!("{}", build.render_usage());
  }
}
