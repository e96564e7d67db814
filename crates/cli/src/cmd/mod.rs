mod build;
mod format;
mod info;
mod lint;
mod update;

use std::path::Path;

use anyhow::{Context, Result};

use ndkpack_lib::platform::HostEnvironment;
use ndkpack_lib::project::ProjectLayout;
use ndkpack_lib::toolchain::{ToolchainProfile, ToolchainResolver};

pub use build::{BuildArgs, cmd_build};
pub use format::cmd_format;
pub use info::cmd_info;
pub use lint::{LintArgs, cmd_lint};
pub use update::cmd_update;

/// Open the project and resolve its toolchain from the current environment.
fn load_project(project: &Path) -> Result<(ProjectLayout, ToolchainProfile)> {
  let layout = ProjectLayout::open(project)
    .with_context(|| format!("Failed to open project at {}", project.display()))?;
  let host = HostEnvironment::capture();
  let toolchain = ToolchainResolver::new(&host, &layout.config().target)
    .resolve()
    .context("Failed to resolve toolchain")?;
  Ok((layout, toolchain))
}
