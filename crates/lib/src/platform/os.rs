use std::fmt;

/// Host operating systems the NDK ships prebuilt toolchains for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Normalise an operating system name, accepting both `std::env::consts::OS`
  /// values (`linux`, `macos`) and `uname`-style names (`Linux`, `Darwin`).
  pub fn parse(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "linux" => Some(Self::Linux),
      "macos" | "darwin" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Suffix of native executables on this OS.
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      Self::Linux | Self::MacOs => "",
    }
  }

  /// Suffix of the NDK's clang driver wrappers, which are batch scripts on Windows.
  pub fn wrapper_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".cmd",
      Self::Linux | Self::MacOs => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn darwin_and_macos_are_the_same_os() {
    assert_eq!(Os::parse("Darwin"), Some(Os::MacOs));
    assert_eq!(Os::parse("macos"), Some(Os::MacOs));
  }

  #[test]
  fn macos_uses_darwin_identifier() {
    // Darwin is the identifier used by the NDK's prebuilt directories
    assert_eq!(Os::MacOs.as_str(), "darwin");
  }

  #[test]
  fn plan9_is_rejected() {
    assert_eq!(Os::parse("Plan9"), None);
  }
}
