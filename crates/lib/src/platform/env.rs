//! Snapshot of the host environment.
//!
//! Everything the toolchain resolver reads from the host is captured once into a
//! [`HostEnvironment`] value at startup. Nothing downstream consults `std::env`
//! again, so tests can hand the resolver a fabricated host instead.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Host variables, architecture and OS as observed at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnvironment {
  arch: String,
  os: String,
  vars: BTreeMap<String, String>,
}

impl HostEnvironment {
  /// Create an environment with no variables for the given architecture/OS pair.
  pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
    Self {
      arch: arch.into(),
      os: os.into(),
      vars: BTreeMap::new(),
    }
  }

  /// Capture the current process environment. Variables that are not valid
  /// UTF-8 are skipped.
  pub fn capture() -> Self {
    Self {
      arch: std::env::consts::ARCH.to_string(),
      os: std::env::consts::OS.to_string(),
      vars: std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect(),
    }
  }

  pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.vars.insert(key.into(), value.into());
    self
  }

  pub fn arch(&self) -> &str {
    &self.arch
  }

  pub fn os(&self) -> &str {
    &self.os
  }

  /// Returns the value of `key`, treating empty values as unset.
  pub fn var(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str).filter(|v| !v.is_empty())
  }

  /// Returns the user's home directory (`HOME`, then `USERPROFILE`).
  pub fn home_dir(&self) -> Option<PathBuf> {
    self.var("HOME").or_else(|| self.var("USERPROFILE")).map(PathBuf::from)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn empty_values_count_as_unset() {
    let env = HostEnvironment::new("x86_64", "linux").with_var("ANDROID_NDK_HOME", "");
    assert_eq!(env.var("ANDROID_NDK_HOME"), None);
  }

  #[test]
  fn home_falls_back_to_userprofile() {
    let env = HostEnvironment::new("x86_64", "windows").with_var("USERPROFILE", "C:\\Users\\dev");
    assert_eq!(env.home_dir(), Some(PathBuf::from("C:\\Users\\dev")));
  }

  #[test]
  #[serial]
  fn capture_reads_process_environment() {
    temp_env::with_vars(
      [("ANDROID_NDK_HOME", Some("/opt/ndk")), ("TERMUX_VERSION", None::<&str>)],
      || {
        let env = HostEnvironment::capture();
        assert_eq!(env.var("ANDROID_NDK_HOME"), Some("/opt/ndk"));
        assert_eq!(env.var("TERMUX_VERSION"), None);
        assert_eq!(env.arch(), std::env::consts::ARCH);
      },
    );
  }
}
