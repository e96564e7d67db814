use std::fmt;

/// Host CPU architectures the NDK ships prebuilt toolchains for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86_64,
  Aarch64,
}

impl Arch {
  /// Normalise an architecture name as reported by the host.
  ///
  /// Accepts the spellings used by Rust (`x86_64`, `aarch64`), Windows (`AMD64`, `ARM64`)
  /// and macOS (`arm64`), case-insensitively.
  pub fn parse(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
      "aarch64" | "arm64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn windows_and_macos_spellings_normalise() {
    assert_eq!(Arch::parse("AMD64"), Some(Arch::X86_64));
    assert_eq!(Arch::parse("arm64"), Some(Arch::Aarch64));
    assert_eq!(Arch::parse("aarch64"), Some(Arch::Aarch64));
  }

  #[test]
  fn unknown_architecture_is_rejected() {
    assert_eq!(Arch::parse("arm"), None);
    assert_eq!(Arch::parse("riscv64"), None);
  }
}
