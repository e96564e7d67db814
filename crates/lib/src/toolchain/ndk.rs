//! Locating an Android NDK installation on the host.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{NDK_HOME_VAR, NDK_ROOT_VAR, SDK_ROOT_VAR};
use crate::platform::HostEnvironment;
use crate::platform::os::Os;

/// Places an NDK may be found, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdkSource {
  /// `ANDROID_NDK_HOME`
  NdkHome,
  /// `ANDROID_NDK_ROOT`
  NdkRoot,
  /// `ANDROID_SDK_ROOT/ndk/<version>` as laid out by the SDK manager
  SdkManager,
  /// The SDK manager's default location under the user's home directory
  HomeDefault,
}

impl NdkSource {
  pub const ALL: [NdkSource; 4] = [Self::NdkHome, Self::NdkRoot, Self::SdkManager, Self::HomeDefault];

  fn candidate(self, host: &HostEnvironment) -> Candidate {
    match self {
      Self::NdkHome => Candidate::from_var(host.var(NDK_HOME_VAR)),
      Self::NdkRoot => Candidate::from_var(host.var(NDK_ROOT_VAR)),
      Self::SdkManager => match host.var(SDK_ROOT_VAR) {
        Some(sdk) => Candidate::versioned(&Path::new(sdk).join("ndk")),
        None => Candidate::Unset,
      },
      Self::HomeDefault => match host.home_dir() {
        Some(home) => Candidate::versioned(&default_sdk_dir(&home, Os::parse(host.os())).join("ndk")),
        None => Candidate::Unset,
      },
    }
  }
}

impl fmt::Display for NdkSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NdkHome => f.write_str(NDK_HOME_VAR),
      Self::NdkRoot => f.write_str(NDK_ROOT_VAR),
      Self::SdkManager => write!(f, "{SDK_ROOT_VAR}/ndk"),
      Self::HomeDefault => f.write_str("home directory SDK"),
    }
  }
}

enum Candidate {
  Unset,
  Missing(PathBuf),
  Found(PathBuf),
}

impl Candidate {
  fn from_var(value: Option<&str>) -> Self {
    match value {
      None => Self::Unset,
      Some(path) => Self::check(PathBuf::from(path)),
    }
  }

  fn check(path: PathBuf) -> Self {
    if path.is_dir() { Self::Found(path) } else { Self::Missing(path) }
  }

  /// The SDK manager installs each NDK under a version-named directory.
  fn versioned(ndk_dir: &Path) -> Self {
    match first_subdir(ndk_dir) {
      Some(path) => Self::Found(path),
      None => Self::Missing(ndk_dir.to_path_buf()),
    }
  }
}

fn default_sdk_dir(home: &Path, os: Option<Os>) -> PathBuf {
  match os {
    Some(Os::MacOs) => home.join("Library").join("Android").join("sdk"),
    _ => home.join("Android").join("Sdk"),
  }
}

/// First subdirectory of `dir` in name order.
fn first_subdir(dir: &Path) -> Option<PathBuf> {
  let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
    .ok()?
    .filter_map(|entry| entry.ok())
    .map(|entry| entry.path())
    .filter(|path| path.is_dir())
    .collect();
  subdirs.sort();
  subdirs.into_iter().next()
}

/// Walk [`NdkSource::ALL`] and return the first existing NDK root.
///
/// On failure the error lists every place that was looked at, so the caller can
/// report them.
pub fn locate(host: &HostEnvironment) -> Result<(NdkSource, PathBuf), Vec<String>> {
  let mut searched = Vec::new();

  for source in NdkSource::ALL {
    match source.candidate(host) {
      Candidate::Found(path) => {
        debug!(source = %source, path = %path.display(), "found NDK");
        return Ok((source, path));
      }
      Candidate::Missing(path) => searched.push(format!("{source} ({} does not exist)", path.display())),
      Candidate::Unset => searched.push(format!("{source} (unset)")),
    }
  }

  Err(searched)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn ndk_home_wins_over_everything() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("ndk-home");
    let root = temp.path().join("ndk-root");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&root).unwrap();

    let host = HostEnvironment::new("x86_64", "linux")
      .with_var(NDK_HOME_VAR, home.to_str().unwrap())
      .with_var(NDK_ROOT_VAR, root.to_str().unwrap());

    assert_eq!(locate(&host).unwrap(), (NdkSource::NdkHome, home));
  }

  #[test]
  fn missing_ndk_home_falls_through_to_alternate_name() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ndk-root");
    std::fs::create_dir_all(&root).unwrap();

    let host = HostEnvironment::new("x86_64", "linux")
      .with_var(NDK_HOME_VAR, temp.path().join("gone").to_str().unwrap())
      .with_var(NDK_ROOT_VAR, root.to_str().unwrap());

    assert_eq!(locate(&host).unwrap(), (NdkSource::NdkRoot, root));
  }

  #[test]
  fn sdk_manager_picks_first_version_directory() {
    let temp = TempDir::new().unwrap();
    let ndk = temp.path().join("sdk").join("ndk");
    std::fs::create_dir_all(ndk.join("27.0.12077973")).unwrap();
    std::fs::create_dir_all(ndk.join("26.1.10909125")).unwrap();
    std::fs::write(ndk.join("README"), "not a version").unwrap();

    let host = HostEnvironment::new("x86_64", "linux").with_var(SDK_ROOT_VAR, temp.path().join("sdk").to_str().unwrap());

    let (source, path) = locate(&host).unwrap();
    assert_eq!(source, NdkSource::SdkManager);
    assert_eq!(path, ndk.join("26.1.10909125"));
  }

  #[test]
  fn home_default_location_is_last_resort() {
    let temp = TempDir::new().unwrap();
    let version = temp.path().join("Android").join("Sdk").join("ndk").join("27.0.0");
    std::fs::create_dir_all(&version).unwrap();

    let host = HostEnvironment::new("aarch64", "linux").with_var("HOME", temp.path().to_str().unwrap());

    assert_eq!(locate(&host).unwrap(), (NdkSource::HomeDefault, version));
  }

  #[test]
  fn darwin_home_default_uses_library_dir() {
    let temp = TempDir::new().unwrap();
    let version = temp.path().join("Library").join("Android").join("sdk").join("ndk").join("27.0.0");
    std::fs::create_dir_all(&version).unwrap();

    let host = HostEnvironment::new("aarch64", "macos").with_var("HOME", temp.path().to_str().unwrap());

    assert_eq!(locate(&host).unwrap(), (NdkSource::HomeDefault, version));
  }

  #[test]
  fn nothing_found_lists_every_source() {
    let temp = TempDir::new().unwrap();
    let host = HostEnvironment::new("x86_64", "linux").with_var("HOME", temp.path().to_str().unwrap());

    let searched = locate(&host).unwrap_err();
    assert_eq!(searched.len(), NdkSource::ALL.len());
    assert!(searched[0].contains("ANDROID_NDK_HOME (unset)"));
    assert!(searched[3].contains("does not exist"));
  }
}
