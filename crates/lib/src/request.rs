//! Build requests.
//!
//! A [`BuildRequest`] is the validated form of the `build` flags. It can only be
//! obtained through [`BuildRequest::from_flags`] (or the constructors for a
//! single action), so a pipeline never sees a conflicting combination.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Rejected flag combinations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
  #[error("missing build task: pass --release, --debug, --check or --clean")]
  MissingAction,

  #[error("conflicting build arguments: --release and --debug")]
  ConflictingVariants,

  #[error("conflicting build arguments: --clean cannot be combined with {0}")]
  ConflictingClean(&'static str),

  #[error("invalid feature name: {0:?}")]
  InvalidFeature(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
  #[default]
  Debug,
  Release,
}

impl Variant {
  /// Cargo profile directory name, also used in archive names.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "debug",
      Self::Release => "release",
    }
  }

  pub fn is_release(&self) -> bool {
    matches!(self, Self::Release)
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  Clean,
  Check,
  Build,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Clean => "clean",
      Self::Check => "check",
      Self::Build => "build",
    })
  }
}

/// Raw `build` flags as parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
  pub release: bool,
  pub debug: bool,
  pub clean: bool,
  pub check: bool,
  pub nightly: bool,
  pub verbose: bool,
  pub features: Vec<String>,
  pub no_default_features: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  variant: Variant,
  action: Action,
  feature_flags: BTreeSet<String>,
  no_default_features: bool,
  use_nightly: bool,
  verbose: bool,
}

impl BuildRequest {
  /// Validate a flag combination.
  ///
  /// `--check` may carry a variant (it selects the profile being checked);
  /// `--clean` may not be combined with anything that builds. Feature lists
  /// may be comma separated.
  ///
  /// # Errors
  ///
  /// Returns [`RequestError`] for missing or conflicting actions and malformed
  /// feature names.
  pub fn from_flags(flags: &BuildFlags) -> Result<Self, RequestError> {
    if flags.release && flags.debug {
      return Err(RequestError::ConflictingVariants);
    }
    if flags.clean {
      if flags.release || flags.debug {
        return Err(RequestError::ConflictingClean(if flags.release { "--release" } else { "--debug" }));
      }
      if flags.check {
        return Err(RequestError::ConflictingClean("--check"));
      }
    }

    let action = if flags.clean {
      Action::Clean
    } else if flags.check {
      Action::Check
    } else if flags.release || flags.debug {
      Action::Build
    } else {
      return Err(RequestError::MissingAction);
    };

    let mut feature_flags = BTreeSet::new();
    for feature in flags.features.iter().flat_map(|list| list.split(',')) {
      let feature = feature.trim();
      if feature.is_empty() || feature.chars().any(char::is_whitespace) {
        return Err(RequestError::InvalidFeature(feature.to_string()));
      }
      feature_flags.insert(feature.to_string());
    }

    Ok(Self {
      variant: if flags.release { Variant::Release } else { Variant::Debug },
      action,
      feature_flags,
      no_default_features: flags.no_default_features,
      use_nightly: flags.nightly,
      verbose: flags.verbose,
    })
  }

  pub fn build(variant: Variant) -> Self {
    Self::with_action(Action::Build, variant)
  }

  pub fn check(variant: Variant) -> Self {
    Self::with_action(Action::Check, variant)
  }

  pub fn clean() -> Self {
    Self::with_action(Action::Clean, Variant::Debug)
  }

  fn with_action(action: Action, variant: Variant) -> Self {
    Self {
      variant,
      action,
      feature_flags: BTreeSet::new(),
      no_default_features: false,
      use_nightly: false,
      verbose: false,
    }
  }

  #[must_use]
  pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
    self.feature_flags.insert(feature.into());
    self
  }

  #[must_use]
  pub fn with_nightly(mut self, nightly: bool) -> Self {
    self.use_nightly = nightly;
    self
  }

  #[must_use]
  pub fn with_verbose(mut self, verbose: bool) -> Self {
    self.verbose = verbose;
    self
  }

  #[must_use]
  pub fn without_default_features(mut self) -> Self {
    self.no_default_features = true;
    self
  }

  pub fn variant(&self) -> Variant {
    self.variant
  }

  pub fn action(&self) -> Action {
    self.action
  }

  /// Requested features in name order.
  pub fn feature_flags(&self) -> &BTreeSet<String> {
    &self.feature_flags
  }

  pub fn has_feature(&self, feature: &str) -> bool {
    self.feature_flags.contains(feature)
  }

  pub fn no_default_features(&self) -> bool {
    self.no_default_features
  }

  pub fn use_nightly(&self) -> bool {
    self.use_nightly
  }

  pub fn verbose(&self) -> bool {
    self.verbose
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flags() -> BuildFlags {
    BuildFlags::default()
  }

  #[test]
  fn release_and_debug_conflict() {
    let err = BuildRequest::from_flags(&BuildFlags {
      release: true,
      debug: true,
      ..flags()
    })
    .unwrap_err();
    assert_eq!(err, RequestError::ConflictingVariants);

    // the conflict wins over any action
    for (clean, check) in [(true, false), (false, true), (true, true)] {
      let err = BuildRequest::from_flags(&BuildFlags {
        release: true,
        debug: true,
        clean,
        check,
        ..flags()
      })
      .unwrap_err();
      assert_eq!(err, RequestError::ConflictingVariants);
    }
  }

  #[test]
  fn clean_conflicts_with_build_and_check() {
    let cases = [
      (
        BuildFlags {
          clean: true,
          release: true,
          ..flags()
        },
        "--release",
      ),
      (
        BuildFlags {
          clean: true,
          debug: true,
          ..flags()
        },
        "--debug",
      ),
      (
        BuildFlags {
          clean: true,
          check: true,
          ..flags()
        },
        "--check",
      ),
    ];

    for (flags, conflicting) in cases {
      assert_eq!(
        BuildRequest::from_flags(&flags),
        Err(RequestError::ConflictingClean(conflicting))
      );
    }
  }

  #[test]
  fn no_action_is_rejected() {
    let err = BuildRequest::from_flags(&BuildFlags {
      nightly: true,
      verbose: true,
      ..flags()
    })
    .unwrap_err();
    assert_eq!(err, RequestError::MissingAction);
  }

  #[test]
  fn check_keeps_requested_variant() {
    let request = BuildRequest::from_flags(&BuildFlags {
      check: true,
      release: true,
      ..flags()
    })
    .unwrap();

    assert_eq!(request.action(), Action::Check);
    assert_eq!(request.variant(), Variant::Release);

    let request = BuildRequest::from_flags(&BuildFlags {
      check: true,
      ..flags()
    })
    .unwrap();
    assert_eq!(request.variant(), Variant::Debug);
  }

  #[test]
  fn build_request_carries_options() {
    let request = BuildRequest::from_flags(&BuildFlags {
      release: true,
      nightly: true,
      verbose: true,
      features: vec!["use_ebpf,use_binder".to_string(), "use_binder".to_string()],
      no_default_features: true,
      ..flags()
    })
    .unwrap();

    assert_eq!(request.action(), Action::Build);
    assert_eq!(request.variant(), Variant::Release);
    assert!(request.use_nightly());
    assert!(request.verbose());
    assert!(request.no_default_features());
    assert_eq!(
      request.feature_flags().iter().collect::<Vec<_>>(),
      ["use_binder", "use_ebpf"]
    );
  }

  #[test]
  fn blank_feature_is_rejected() {
    let err = BuildRequest::from_flags(&BuildFlags {
      debug: true,
      features: vec!["a,,b".to_string()],
      ..flags()
    })
    .unwrap_err();
    assert_eq!(err, RequestError::InvalidFeature(String::new()));
  }
}
