use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use ndkpack_lib::command::ProcessExecutor;
use ndkpack_lib::tasks::Tasks;

use crate::output::{format_duration, print_stat, print_success};

pub fn cmd_format(project: &Path, verbose: bool) -> Result<()> {
  let start = Instant::now();
  let (layout, toolchain) = super::load_project(project)?;

  let results = Tasks::new(&toolchain, &layout, ProcessExecutor)
    .format(verbose)
    .context("Formatting failed")?;

  println!();
  print_success("Sources formatted");
  print_stat("Commands", &results.len().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
