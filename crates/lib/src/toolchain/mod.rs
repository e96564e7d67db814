//! Toolchain resolution.
//!
//! [`ToolchainResolver`] turns a captured [`HostEnvironment`] into a
//! [`ToolchainProfile`]: the concrete programs used for cross-building,
//! linking, stripping, formatting and static analysis. The profile is resolved
//! once per process and only ever borrowed afterwards.

pub mod ndk;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{BINDGEN_CLANG_ARGS_VAR, TERMUX_DEFAULT_PREFIX, TERMUX_PREFIX_VAR, TERMUX_SENTINEL_VAR};
use crate::platform::os::Os;
use crate::platform::{HostEnvironment, Platform, PrebuiltHost};
use crate::project::TargetConfig;

pub use ndk::NdkSource;

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("no Android NDK found; set ANDROID_NDK_HOME (searched: {})", searched.join(", "))]
  NdkNotFound { searched: Vec<String> },

  #[error("unsupported host platform: {arch} {os}")]
  UnsupportedPlatform { arch: String, os: String },
}

/// A program plus the leading arguments every invocation of it starts with,
/// e.g. `cargo ndk -p 31 -t arm64-v8a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPrefix {
  program: PathBuf,
  args: Vec<String>,
}

impl CommandPrefix {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }
}

impl fmt::Display for CommandPrefix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}

/// Where the profile's tools come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainSource {
  /// Termux: every tool is already on `PATH`.
  OnPath,
  /// An NDK installation and the prebuilt toolchain selected for this host.
  Ndk {
    source: NdkSource,
    root: PathBuf,
    prebuilt: PrebuiltHost,
    bin_dir: PathBuf,
  },
}

/// Resolved toolchain. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainProfile {
  platform_os: String,
  platform_arch: String,
  source: ToolchainSource,
  cargo: PathBuf,
  cross_compiler: CommandPrefix,
  nightly_cross_compiler: CommandPrefix,
  native_compiler: PathBuf,
  stripper: PathBuf,
  formatter: PathBuf,
  static_analyzer: PathBuf,
  extra_env: BTreeMap<String, String>,
}

impl ToolchainProfile {
  pub fn platform_os(&self) -> &str {
    &self.platform_os
  }

  pub fn platform_arch(&self) -> &str {
    &self.platform_arch
  }

  pub fn source(&self) -> &ToolchainSource {
    &self.source
  }

  /// Plain host `cargo`, for housekeeping commands that do not cross-compile.
  pub fn cargo(&self) -> &Path {
    &self.cargo
  }

  pub fn cross_compiler(&self) -> &CommandPrefix {
    &self.cross_compiler
  }

  pub fn nightly_cross_compiler(&self) -> &CommandPrefix {
    &self.nightly_cross_compiler
  }

  /// The cross-compiler prefix for a stable or nightly build.
  pub fn cross_compiler_for(&self, nightly: bool) -> &CommandPrefix {
    if nightly { &self.nightly_cross_compiler } else { &self.cross_compiler }
  }

  pub fn native_compiler(&self) -> &Path {
    &self.native_compiler
  }

  pub fn stripper(&self) -> &Path {
    &self.stripper
  }

  pub fn formatter(&self) -> &Path {
    &self.formatter
  }

  pub fn static_analyzer(&self) -> &Path {
    &self.static_analyzer
  }

  /// Environment applied to every command dispatched with this profile.
  pub fn extra_env(&self) -> &BTreeMap<String, String> {
    &self.extra_env
  }
}

/// Resolves a [`ToolchainProfile`] for one Android target.
pub struct ToolchainResolver<'a> {
  host: &'a HostEnvironment,
  target: &'a TargetConfig,
}

impl<'a> ToolchainResolver<'a> {
  pub fn new(host: &'a HostEnvironment, target: &'a TargetConfig) -> Self {
    Self { host, target }
  }

  /// Resolve the toolchain.
  ///
  /// # Errors
  ///
  /// Returns an error if no NDK can be located or the host has no prebuilt
  /// NDK toolchain.
  pub fn resolve(&self) -> Result<ToolchainProfile, ToolchainError> {
    if self.host.var(TERMUX_SENTINEL_VAR).is_some() {
      info!("termux detected, using tools from PATH");
      return Ok(self.on_path());
    }

    let (source, root) = ndk::locate(self.host).map_err(|searched| ToolchainError::NdkNotFound { searched })?;

    let unsupported = || ToolchainError::UnsupportedPlatform {
      arch: self.host.arch().to_string(),
      os: self.host.os().to_string(),
    };
    let platform = Platform::parse(self.host.arch(), self.host.os()).ok_or_else(unsupported)?;
    let prebuilt = platform.prebuilt_host().ok_or_else(unsupported)?;

    let prebuilt_dir = root
      .join("toolchains")
      .join("llvm")
      .join("prebuilt")
      .join(prebuilt.dir_name());
    let bin_dir = prebuilt_dir.join("bin");

    let mut extra_env = BTreeMap::new();
    if platform.os == Os::MacOs {
      // bindgen otherwise picks up the macOS SDK headers
      extra_env.insert(
        BINDGEN_CLANG_ARGS_VAR.to_string(),
        format!("--sysroot={}", prebuilt_dir.join("sysroot").display()),
      );
    }

    let exe = platform.os.exe_suffix();
    let target = self.target;
    let profile = ToolchainProfile {
      platform_os: self.host.os().to_string(),
      platform_arch: self.host.arch().to_string(),
      cargo: PathBuf::from("cargo"),
      cross_compiler: self.cargo_ndk(None),
      nightly_cross_compiler: self.cargo_ndk(Some("+nightly")),
      native_compiler: bin_dir.join(format!(
        "{}{}-clang++{}",
        target.triple,
        target.api_level,
        platform.os.wrapper_suffix()
      )),
      stripper: bin_dir.join(format!("llvm-strip{exe}")),
      formatter: PathBuf::from("clang-format"),
      static_analyzer: bin_dir.join(format!("clang-tidy{exe}")),
      extra_env,
      source: ToolchainSource::Ndk {
        source,
        root,
        prebuilt,
        bin_dir,
      },
    };

    info!(ndk = %prebuilt, source = %source, "resolved toolchain");
    Ok(profile)
  }

  fn on_path(&self) -> ToolchainProfile {
    let prefix = self.host.var(TERMUX_PREFIX_VAR).unwrap_or(TERMUX_DEFAULT_PREFIX);
    let nightly_cargo = Path::new(prefix).join("opt").join("rust-nightly").join("bin").join("cargo");

    ToolchainProfile {
      platform_os: self.host.os().to_string(),
      platform_arch: self.host.arch().to_string(),
      source: ToolchainSource::OnPath,
      cargo: PathBuf::from("cargo"),
      cross_compiler: CommandPrefix::new("cargo"),
      nightly_cross_compiler: CommandPrefix::new(nightly_cargo),
      native_compiler: PathBuf::from("clang++"),
      stripper: PathBuf::from("strip"),
      formatter: PathBuf::from("clang-format"),
      static_analyzer: PathBuf::from("clang-tidy"),
      extra_env: BTreeMap::new(),
    }
  }

  fn cargo_ndk(&self, toolchain: Option<&str>) -> CommandPrefix {
    CommandPrefix::new("cargo").with_args(toolchain.into_iter().map(str::to_string).chain([
      "ndk".to_string(),
      "-p".to_string(),
      self.target.api_level.to_string(),
      "-t".to_string(),
      self.target.abi.clone(),
    ]))
  }
}
