//! Host platform detection and the NDK prebuilt-directory table.

pub mod arch;
pub mod env;
pub mod os;

use std::fmt;

use arch::Arch;
use os::Os;

pub use env::HostEnvironment;

/// Platform identifier combining architecture and OS (e.g., "aarch64-linux")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

/// Prebuilt LLVM toolchain flavours shipped inside an NDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrebuiltHost {
  WindowsX86_64,
  LinuxX86_64,
  LinuxAarch64,
  DarwinX86_64,
}

impl PrebuiltHost {
  /// Directory name under `toolchains/llvm/prebuilt`.
  pub fn dir_name(&self) -> &'static str {
    match self {
      Self::WindowsX86_64 => "windows-x86_64",
      Self::LinuxX86_64 => "linux-x86_64",
      Self::LinuxAarch64 => "linux-aarch64",
      Self::DarwinX86_64 => "darwin-x86_64",
    }
  }
}

impl fmt::Display for PrebuiltHost {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.dir_name())
  }
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Parse host-reported names into a platform.
  ///
  /// Returns `None` if either half is not a recognised spelling.
  pub fn parse(arch: &str, os: &str) -> Option<Self> {
    Some(Self {
      arch: Arch::parse(arch)?,
      os: Os::parse(os)?,
    })
  }

  /// Select the NDK prebuilt toolchain that runs on this platform.
  ///
  /// The NDK only ships an x86_64 Darwin toolchain, which Apple silicon runs
  /// under Rosetta, so every Darwin host maps to it.
  pub fn prebuilt_host(&self) -> Option<PrebuiltHost> {
    match (self.arch, self.os) {
      (Arch::X86_64, Os::Windows) => Some(PrebuiltHost::WindowsX86_64),
      (Arch::X86_64, Os::Linux) => Some(PrebuiltHost::LinuxX86_64),
      (Arch::Aarch64, Os::Linux) => Some(PrebuiltHost::LinuxAarch64),
      (_, Os::MacOs) => Some(PrebuiltHost::DarwinX86_64),
      (Arch::Aarch64, Os::Windows) => None,
    }
  }

  /// Returns the platform triple string (e.g., "aarch64-linux")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
