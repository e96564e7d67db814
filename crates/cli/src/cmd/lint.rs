use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use ndkpack_lib::command::ProcessExecutor;
use ndkpack_lib::tasks::{LintOptions, Tasks};

use crate::output::{format_duration, print_stat, print_step, print_success};

#[derive(Debug, Args)]
pub struct LintArgs {
  /// Apply clippy suggestions in place
  #[arg(long)]
  fix: bool,

  /// Also run clang-tidy over the native sources
  #[arg(long)]
  tidy: bool,
}

pub fn cmd_lint(project: &Path, args: &LintArgs) -> Result<()> {
  let start = Instant::now();
  let (layout, toolchain) = super::load_project(project)?;

  let options = LintOptions {
    fix: args.fix,
    tidy: args.tidy,
  };
  let results = Tasks::new(&toolchain, &layout, ProcessExecutor)
    .lint(options)
    .context("Lint failed")?;

  println!();
  for result in &results {
    print_step(&result.stage_name, result.duration);
  }
  print_success(if args.fix { "Lint fixes applied" } else { "Lint passed" });
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
