//! `ndkpack.toml` project manifest.
//!
//! Every field has a default, so a project without a manifest still builds as a
//! single-binary module for `aarch64-linux-android` at API level 31.
//!
//! ```toml
//! [package]
//! name = "fas-rs"
//!
//! [template]
//! default = "module"
//! features = { use_binder = "module/fas-rs-zygisk" }
//!
//! [native]
//! feature = "use_binder"
//! dir = "zygisk"
//!
//! [webui]
//! dir = "webui"
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid project manifest {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("invalid project manifest: {0}")]
  Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
  pub package: PackageConfig,
  pub target: TargetConfig,
  pub cross: CrossConfig,
  pub template: TemplateConfig,
  pub native: Option<NativeConfig>,
  pub webui: Option<WebUiConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
  /// Archive base name. Defaults to the project directory name.
  pub name: String,
  /// Binary produced by the cross-build. Defaults to `name`.
  pub binary: String,
}

/// The Android target every cross-build is compiled for.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
  pub triple: String,
  pub abi: String,
  pub api_level: u32,
}

impl Default for TargetConfig {
  fn default() -> Self {
    Self {
      triple: "aarch64-linux-android".to_string(),
      abi: "arm64-v8a".to_string(),
      api_level: 31,
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CrossConfig {
  /// Passed to the primary cross-build through `RUSTFLAGS`.
  pub rustflags: Vec<String>,
}

impl Default for CrossConfig {
  fn default() -> Self {
    Self {
      rustflags: vec!["-C".to_string(), "default-linker-libraries".to_string()],
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
  /// Template used when no requested feature has its own.
  pub default: PathBuf,
  /// File names dropped from the staged package.
  pub ignore: Vec<String>,
  /// Feature name to template directory.
  pub features: BTreeMap<String, PathBuf>,
}

impl Default for TemplateConfig {
  fn default() -> Self {
    Self {
      default: PathBuf::from("module"),
      ignore: vec![".gitignore".to_string()],
      features: BTreeMap::new(),
    }
  }
}

/// A C++ shared library linked against a Rust static library, built only when
/// `feature` is requested. Paths other than `dir` are relative to `dir`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NativeConfig {
  pub feature: String,
  pub dir: PathBuf,
  pub crate_dir: PathBuf,
  pub static_lib: String,
  pub sources: PathBuf,
  pub include: PathBuf,
  pub link_search: Vec<PathBuf>,
  pub link_libs: Vec<String>,
  pub output: String,
  /// Location of the shared library inside the staged package.
  pub stage_as: PathBuf,
}

impl Default for NativeConfig {
  fn default() -> Self {
    Self {
      feature: "use_binder".to_string(),
      dir: PathBuf::from("zygisk"),
      crate_dir: PathBuf::from("rust"),
      static_lib: "rust".to_string(),
      sources: PathBuf::from("src"),
      include: PathBuf::from("rust").join("include"),
      link_search: vec![PathBuf::from("..").join("prebuilt")],
      link_libs: vec!["log".to_string(), "binder_ndk".to_string()],
      output: "arm64-v8a.so".to_string(),
      stage_as: PathBuf::from("zygisk").join("arm64-v8a.so"),
    }
  }
}

/// A web interface built by its own toolchain (npm by default) during staging.
/// `output` is relative to `dir`; its contents land under `stage_as`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WebUiConfig {
  pub dir: PathBuf,
  /// Each entry is one argument vector, run in order from `dir`.
  pub commands: Vec<Vec<String>>,
  pub output: PathBuf,
  pub stage_as: PathBuf,
}

impl Default for WebUiConfig {
  fn default() -> Self {
    let command = |args: &[&str]| args.iter().map(|arg| (*arg).to_string()).collect();
    Self {
      dir: PathBuf::from("webui"),
      commands: vec![command(&["npm", "install"]), command(&["npm", "run", "build"])],
      output: PathBuf::from("webroot"),
      stage_as: PathBuf::from("webroot"),
    }
  }
}

impl ProjectConfig {
  /// Parse a manifest, filling package names from `fallback_name` when absent.
  pub fn parse(content: &str, path: &Path, fallback_name: &str) -> Result<Self, ConfigError> {
    let mut config: ProjectConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.fill_defaults(fallback_name);
    config.validate()?;
    Ok(config)
  }

  /// Defaults for a project without a manifest.
  pub fn for_project(fallback_name: &str) -> Self {
    let mut config = Self::default();
    config.fill_defaults(fallback_name);
    config
  }

  fn fill_defaults(&mut self, fallback_name: &str) {
    if self.package.name.is_empty() {
      self.package.name = fallback_name.to_string();
    }
    if self.package.binary.is_empty() {
      self.package.binary = self.package.name.clone();
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.target.triple.is_empty() || self.target.abi.is_empty() {
      return Err(ConfigError::Invalid("target triple and abi must not be empty".to_string()));
    }
    if let Some(native) = &self.native {
      if native.feature.is_empty() {
        return Err(ConfigError::Invalid("native.feature must not be empty".to_string()));
      }
      ensure_plain("native.stage_as", &native.stage_as)?;
      ensure_file_name("native.output", &native.output)?;
    }
    ensure_file_name("package.binary", &self.package.binary)?;
    if let Some(webui) = &self.webui {
      if webui.commands.iter().any(Vec::is_empty) {
        return Err(ConfigError::Invalid("webui.commands must not contain empty commands".to_string()));
      }
      ensure_plain("webui.stage_as", &webui.stage_as)?;
    }
    Ok(())
  }

  /// Template for a set of requested features: the first feature (in name order)
  /// with its own template, else the default one.
  pub fn template_for<'a>(&self, features: impl IntoIterator<Item = &'a String>) -> &Path {
    features
      .into_iter()
      .find_map(|feature| self.template.features.get(feature))
      .unwrap_or(&self.template.default)
  }
}

/// Paths inside the staged package must be relative and made of plain segments only.
fn ensure_plain(field: &str, path: &Path) -> Result<(), ConfigError> {
  let mut components = path.components().peekable();
  let plain = components.peek().is_some() && components.all(|component| matches!(component, Component::Normal(_)));
  if plain {
    Ok(())
  } else {
    Err(ConfigError::Invalid(format!(
      "{field} must be a relative path of plain segments: {}",
      path.display()
    )))
  }
}

fn ensure_file_name(field: &str, name: &str) -> Result<(), ConfigError> {
  let mut components = Path::new(name).components();
  match (components.next(), components.next()) {
    (Some(Component::Normal(_)), None) => Ok(()),
    _ => Err(ConfigError::Invalid(format!("{field} must be a plain file name: {name}"))),
  }
}
