//! Implementation of the `ndkpack build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use ndkpack_lib::command::ProcessExecutor;
use ndkpack_lib::pipeline::BuildPipeline;
use ndkpack_lib::request::{Action, BuildFlags, BuildRequest};

use crate::output::{format_bytes, format_duration, print_stat, print_step, print_success};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Build the release variant
  #[arg(short, long)]
  release: bool,

  /// Build the debug variant
  #[arg(short, long)]
  debug: bool,

  /// Remove build outputs and run cargo clean
  #[arg(long)]
  clean: bool,

  /// Type-check only, without packaging
  #[arg(long)]
  check: bool,

  /// Use the nightly toolchain with -Z build-std
  #[arg(long)]
  nightly: bool,

  /// Comma separated list of features to enable
  #[arg(long, value_name = "FEATURES")]
  features: Vec<String>,

  /// Do not enable the default features
  #[arg(long)]
  no_default_features: bool,
}

impl BuildArgs {
  fn flags(&self, verbose: bool) -> BuildFlags {
    BuildFlags {
      release: self.release,
      debug: self.debug,
      clean: self.clean,
      check: self.check,
      nightly: self.nightly,
      verbose,
      features: self.features.clone(),
      no_default_features: self.no_default_features,
    }
  }
}

/// Execute the build command.
///
/// Flags are validated before anything touches the environment, so a
/// conflicting combination fails without an NDK being present.
pub fn cmd_build(project: &Path, args: &BuildArgs, verbose: bool) -> Result<()> {
  let start = Instant::now();
  let request = BuildRequest::from_flags(&args.flags(verbose))?;
  debug!(?request, "validated build request");
  let (layout, toolchain) = super::load_project(project)?;

  let mut pipeline = BuildPipeline::new(&toolchain, &layout, ProcessExecutor);
  let report = pipeline
    .run(&request)
    .with_context(|| format!("{} failed", request.action()))?;

  println!();
  for result in &report.results {
    print_step(&result.stage_name, result.duration);
  }
  print_success(match request.action() {
    Action::Clean => "Clean complete!",
    Action::Check => "Check complete!",
    Action::Build => "Build complete!",
  });
  print_stat("Project", &layout.config().package.name);
  if request.action() != Action::Clean {
    print_stat("Variant", request.variant().as_str());
  }
  if let Some(archive) = &report.archive {
    print_stat("Archive", &archive.display().to_string());
    if let Ok(metadata) = std::fs::metadata(archive) {
      print_stat("Size", &format_bytes(metadata.len()));
    }
  }
  print_stat("Stage time", &format_duration(report.total_duration()));
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
