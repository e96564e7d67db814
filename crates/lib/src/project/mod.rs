//! Project layout: where sources, templates, build products and archives live.
//!
//! All paths handed out by [`ProjectLayout`] are absolute, rooted at the
//! canonicalized project directory.
//!
//! Running two pipelines against the same project at once is not supported:
//! the output and staging directories are owned by whichever run is active and
//! nothing locks them.

pub mod config;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{CONFIG_FILE_NAME, OUTPUT_DIR, STAGING_DIR, TARGET_DIR};
use crate::request::Variant;

pub use config::{ConfigError, NativeConfig, ProjectConfig, TargetConfig, WebUiConfig};

#[derive(Debug, Clone)]
pub struct ProjectLayout {
  root: PathBuf,
  config: ProjectConfig,
}

impl ProjectLayout {
  /// Open the project at `root`, reading `ndkpack.toml` when present.
  pub fn open(root: &Path) -> Result<Self, ConfigError> {
    let root = dunce::canonicalize(root).map_err(|source| ConfigError::Read {
      path: root.to_path_buf(),
      source,
    })?;
    let fallback_name = root
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| "module".to_string());

    let manifest = root.join(CONFIG_FILE_NAME);
    let config = match std::fs::read_to_string(&manifest) {
      Ok(content) => ProjectConfig::parse(&content, &manifest, &fallback_name)?,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %manifest.display(), "no project manifest, using defaults");
        ProjectConfig::for_project(&fallback_name)
      }
      Err(source) => return Err(ConfigError::Read { path: manifest, source }),
    };

    Ok(Self { root, config })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn config(&self) -> &ProjectConfig {
    &self.config
  }

  pub fn output_dir(&self) -> PathBuf {
    self.root.join(OUTPUT_DIR)
  }

  /// Scratch tree assembled per build, one per variant.
  pub fn staging_root(&self, variant: Variant) -> PathBuf {
    self.output_dir().join(STAGING_DIR).join(variant.as_str())
  }

  /// Where cargo leaves the cross-compiled binary: `target/<triple>/<variant>/<binary>`.
  pub fn binary_path(&self, variant: Variant) -> PathBuf {
    cargo_artifact(&self.root, &self.config.target.triple, variant).join(&self.config.package.binary)
  }

  /// Resolve a template directory from the manifest against the project root.
  pub fn template_dir(&self, template: &Path) -> PathBuf {
    self.root.join(template)
  }

  /// Web UI source directory and its built output, if the manifest declares one.
  pub fn webui(&self) -> Option<(&WebUiConfig, PathBuf, PathBuf)> {
    self.config.webui.as_ref().map(|config| {
      let dir = self.root.join(&config.dir);
      let output = dir.join(&config.output);
      (config, dir, output)
    })
  }

  /// Paths of the native component, if the manifest declares one.
  pub fn native(&self) -> Option<NativeLayout<'_>> {
    self.config.native.as_ref().map(|config| NativeLayout {
      dir: self.root.join(&config.dir),
      triple: &self.config.target.triple,
      config,
    })
  }
}

/// Resolved paths for the native shared-library component.
#[derive(Debug, Clone)]
pub struct NativeLayout<'a> {
  dir: PathBuf,
  triple: &'a str,
  config: &'a NativeConfig,
}

impl NativeLayout<'_> {
  pub fn config(&self) -> &NativeConfig {
    self.config
  }

  /// Component root; the native compiler runs here.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn crate_dir(&self) -> PathBuf {
    self.dir.join(&self.config.crate_dir)
  }

  pub fn output_dir(&self) -> PathBuf {
    self.dir.join(OUTPUT_DIR)
  }

  pub fn sources_dir(&self) -> PathBuf {
    self.dir.join(&self.config.sources)
  }

  pub fn static_lib_name(&self) -> String {
    format!("lib{}.a", self.config.static_lib)
  }

  /// Static library as produced by cargo inside the native crate.
  pub fn built_static_lib(&self, variant: Variant) -> PathBuf {
    cargo_artifact(&self.crate_dir(), self.triple, variant).join(self.static_lib_name())
  }

  /// Linked and stripped shared library.
  pub fn shared_lib(&self) -> PathBuf {
    self.output_dir().join(&self.config.output)
  }
}

fn cargo_artifact(crate_dir: &Path, triple: &str, variant: Variant) -> PathBuf {
  crate_dir.join(TARGET_DIR).join(triple).join(variant.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn open_without_manifest_names_package_after_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("fas-rs");
    std::fs::create_dir(&root).unwrap();

    let layout = ProjectLayout::open(&root).unwrap();

    assert_eq!(layout.config().package.name, "fas-rs");
    assert_eq!(
      layout.binary_path(Variant::Release),
      layout.root().join("target/aarch64-linux-android/release/fas-rs")
    );
    assert_eq!(layout.staging_root(Variant::Debug), layout.root().join("output/.temp/debug"));
  }

  #[test]
  fn open_reads_manifest() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
      temp.path().join(CONFIG_FILE_NAME),
      "[package]\nname = \"demo\"\nbinary = \"demod\"\n[native]\ndir = \"jni\"\n",
    )
    .unwrap();

    let layout = ProjectLayout::open(temp.path()).unwrap();
    let native = layout.native().unwrap();

    assert_eq!(layout.config().package.binary, "demod");
    assert_eq!(native.dir(), layout.root().join("jni"));
    assert_eq!(
      native.built_static_lib(Variant::Debug),
      layout.root().join("jni/rust/target/aarch64-linux-android/debug/librust.a")
    );
    assert_eq!(native.shared_lib(), layout.root().join("jni/output/arm64-v8a.so"));
  }

  #[test]
  fn webui_output_is_relative_to_its_dir() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[webui]\ndir = \"ui\"\n").unwrap();

    let layout = ProjectLayout::open(temp.path()).unwrap();
    let (config, dir, output) = layout.webui().unwrap();

    assert_eq!(config.stage_as, PathBuf::from("webroot"));
    assert_eq!(dir, layout.root().join("ui"));
    assert_eq!(output, layout.root().join("ui/webroot"));
  }

  #[test]
  fn open_missing_root_fails() {
    let temp = TempDir::new().unwrap();
    let err = ProjectLayout::open(&temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
  }
}
