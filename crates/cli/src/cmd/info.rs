use std::path::Path;

use anyhow::{Context, Result};

use ndkpack_lib::platform::{HostEnvironment, Platform};
use ndkpack_lib::project::ProjectLayout;
use ndkpack_lib::toolchain::{ToolchainResolver, ToolchainSource};

use crate::output::{print_info, print_stat, print_warning};

pub fn cmd_info(project: &Path) -> Result<()> {
  let host = HostEnvironment::capture();

  println!("System:");
  match Platform::parse(host.arch(), host.os()) {
    Some(platform) => print_stat("Platform", &platform.to_string()),
    None => print_stat("Platform", &format!("{} {} (unrecognised)", host.arch(), host.os())),
  }

  let layout = ProjectLayout::open(project)
    .with_context(|| format!("Failed to open project at {}", project.display()))?;
  let config = layout.config();

  println!();
  println!("Project:");
  print_stat("Root", &layout.root().display().to_string());
  print_stat("Package", &config.package.name);
  print_stat(
    "Target",
    &format!("{} ({}, API {})", config.target.triple, config.target.abi, config.target.api_level),
  );
  if let Some(native) = layout.native() {
    print_stat(
      "Native",
      &format!("{} (feature {})", native.dir().display(), native.config().feature),
    );
  }

  println!();
  println!("Toolchain:");
  let toolchain = match ToolchainResolver::new(&host, &config.target).resolve() {
    Ok(toolchain) => toolchain,
    Err(err) => {
      print_warning(&err.to_string());
      return Ok(());
    }
  };

  print_stat(
    "Resolved for",
    &format!("{} {}", toolchain.platform_arch(), toolchain.platform_os()),
  );
  match toolchain.source() {
    ToolchainSource::OnPath => print_info("Termux: using tools from PATH"),
    ToolchainSource::Ndk {
      source, root, prebuilt, ..
    } => {
      print_stat("NDK", &root.display().to_string());
      print_stat("Found via", &source.to_string());
      print_stat("Prebuilt", prebuilt.dir_name());
    }
  }
  print_stat("Cross", &toolchain.cross_compiler().to_string());
  print_stat("Nightly", &toolchain.nightly_cross_compiler().to_string());
  print_stat("C++", &toolchain.native_compiler().display().to_string());
  print_stat("Strip", &toolchain.stripper().display().to_string());
  print_stat("Format", &toolchain.formatter().display().to_string());
  print_stat("Tidy", &toolchain.static_analyzer().display().to_string());
  for (key, value) in toolchain.extra_env() {
    print_stat(key, value);
  }

  Ok(())
}
