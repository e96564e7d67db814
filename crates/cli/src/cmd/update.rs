//! Implementation of the `ndkpack update` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use ndkpack_lib::command::ProcessExecutor;
use ndkpack_lib::tasks::Tasks;

use crate::output::{format_duration, print_stat, print_success};

/// Run `cargo update --recursive` for the project and its native crate.
pub fn cmd_update(project: &Path) -> Result<()> {
  let start = Instant::now();
  let (layout, toolchain) = super::load_project(project)?;

  let results = Tasks::new(&toolchain, &layout, ProcessExecutor)
    .update()
    .context("Failed to update dependencies")?;

  println!();
  print_success("Dependencies updated");
  print_stat("Crates", &results.len().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
