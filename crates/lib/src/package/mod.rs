//! Artifact packaging.
//!
//! Packaging happens in two steps separated by stripping:
//!
//! 1. [`ArtifactPackager::assemble`] recreates the staging root from the
//!    template tree and injects the built files.
//! 2. [`ArtifactPackager::archive`] compresses the staging root into a zip.
//!
//! The staging root is left on disk afterwards so a broken package can be
//! inspected; the next run recreates it.

mod archive;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::request::Variant;
use crate::util::remove_dir_if_exists;

/// Timestamp format embedded in archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("{what} not found: {}", path.display())]
  Missing { what: &'static str, path: PathBuf },

  #[error("nothing to archive: {} is empty", path.display())]
  EmptyStaging { path: PathBuf },

  #[error("failed to remove {}: {source}", path.display())]
  Remove { path: PathBuf, source: std::io::Error },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to walk {}: {source}", root.display())]
  Walk { root: PathBuf, source: walkdir::Error },

  #[error("failed to write archive {}: {source}", path.display())]
  Archive { path: PathBuf, source: zip::result::ZipError },
}

/// Archive file name: `<name>_<variant>_<UTC timestamp>.zip`.
pub fn archive_file_name(name: &str, variant: Variant, timestamp: DateTime<Utc>) -> String {
  format!("{}_{}_{}.zip", name, variant, timestamp.format(TIMESTAMP_FORMAT))
}

/// Everything needed to assemble and archive one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactManifest {
  pub staging_root: PathBuf,
  pub template_root: PathBuf,
  /// `(source, destination relative to staging_root)`, copied in order.
  pub injected_files: Vec<(PathBuf, PathBuf)>,
  /// `(source tree, destination relative to staging_root)`, copied after the files.
  pub injected_dirs: Vec<(PathBuf, PathBuf)>,
  /// File names left out of the staged tree.
  pub exclude_patterns: BTreeSet<String>,
  pub output_archive_path: PathBuf,
}

impl ArtifactManifest {
  pub fn new(template_root: PathBuf, staging_root: PathBuf, output_archive_path: PathBuf) -> Self {
    Self {
      staging_root,
      template_root,
      injected_files: Vec::new(),
      injected_dirs: Vec::new(),
      exclude_patterns: BTreeSet::new(),
      output_archive_path,
    }
  }

  #[must_use]
  pub fn inject(mut self, source: PathBuf, relative_dest: PathBuf) -> Self {
    self.injected_files.push((source, relative_dest));
    self
  }

  #[must_use]
  pub fn inject_dir(mut self, source: PathBuf, relative_dest: PathBuf) -> Self {
    self.injected_dirs.push((source, relative_dest));
    self
  }

  #[must_use]
  pub fn exclude<I, S>(mut self, patterns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.exclude_patterns.extend(patterns.into_iter().map(Into::into));
    self
  }
}

/// Copies templates, injects build products and writes archives.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPackager {
  exclude_patterns: BTreeSet<String>,
}

impl ArtifactPackager {
  pub fn new(exclude_patterns: BTreeSet<String>) -> Self {
    Self { exclude_patterns }
  }

  pub fn for_manifest(manifest: &ArtifactManifest) -> Self {
    Self::new(manifest.exclude_patterns.clone())
  }

  /// Stage the template and inject every file listed in the manifest.
  pub fn assemble(&self, manifest: &ArtifactManifest) -> Result<(), PackageError> {
    self.stage(&manifest.template_root, &manifest.staging_root)?;
    for (source, relative_dest) in &manifest.injected_files {
      self.inject(&manifest.staging_root, source, relative_dest)?;
    }
    for (source, relative_dest) in &manifest.injected_dirs {
      self.inject_dir(&manifest.staging_root, source, relative_dest)?;
    }
    Ok(())
  }

  /// Recreate `staging_root` as a copy of `template_root`, minus excluded files.
  ///
  /// # Errors
  ///
  /// Fails if the template does not exist or any filesystem operation other
  /// than removing an absent staging root fails.
  pub fn stage(&self, template_root: &Path, staging_root: &Path) -> Result<(), PackageError> {
    if !template_root.is_dir() {
      return Err(PackageError::Missing {
        what: "template directory",
        path: template_root.to_path_buf(),
      });
    }

    remove_dir_if_exists(staging_root).map_err(|source| PackageError::Remove {
      path: staging_root.to_path_buf(),
      source,
    })?;
    create_dir_all(staging_root)?;

    let copied = self.copy_tree(template_root, staging_root)?;

    info!(template = %template_root.display(), staging = %staging_root.display(), files = copied, "staged template");
    Ok(())
  }

  /// Copy one built file into the staged tree, creating parent directories.
  pub fn inject(&self, staging_root: &Path, source: &Path, relative_dest: &Path) -> Result<PathBuf, PackageError> {
    if !source.is_file() {
      return Err(PackageError::Missing {
        what: "build artifact",
        path: source.to_path_buf(),
      });
    }

    let dest = staging_root.join(relative_dest);
    if let Some(parent) = dest.parent() {
      create_dir_all(parent)?;
    }
    copy_file(source, &dest)?;

    debug!(from = %source.display(), to = %dest.display(), "injected artifact");
    Ok(dest)
  }

  /// Copy a whole directory tree (e.g. a built web UI) under `relative_dest`.
  /// Excluded file names are skipped as in [`ArtifactPackager::stage`].
  pub fn inject_dir(&self, staging_root: &Path, source: &Path, relative_dest: &Path) -> Result<PathBuf, PackageError> {
    if !source.is_dir() {
      return Err(PackageError::Missing {
        what: "directory to inject",
        path: source.to_path_buf(),
      });
    }

    let dest = staging_root.join(relative_dest);
    create_dir_all(&dest)?;
    let files = self.copy_tree(source, &dest)?;

    debug!(from = %source.display(), to = %dest.display(), files, "injected directory");
    Ok(dest)
  }

  /// Compress `staging_root` into a zip at `output_path` and return the path.
  ///
  /// Entries are written in sorted order with paths relative to the staging
  /// root, deflated at the highest level.
  ///
  /// # Errors
  ///
  /// Fails if the staging root is missing or contains no files.
  pub fn archive(&self, staging_root: &Path, output_path: &Path) -> Result<PathBuf, PackageError> {
    if !staging_root.is_dir() {
      return Err(PackageError::Missing {
        what: "staging root",
        path: staging_root.to_path_buf(),
      });
    }
    if let Some(parent) = output_path.parent() {
      create_dir_all(parent)?;
    }

    let entries = archive::write_zip(staging_root, output_path)?;
    info!(archive = %output_path.display(), entries, "wrote archive");
    Ok(output_path.to_path_buf())
  }

  /// Copy everything below `from` into the existing directory `to`.
  /// Returns the number of files copied.
  fn copy_tree(&self, from: &Path, to: &Path) -> Result<usize, PackageError> {
    let walker = WalkDir::new(from)
      .min_depth(1)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !self.is_excluded(entry.path()));

    let mut copied = 0usize;
    for entry in walker {
      let entry = entry.map_err(|source| PackageError::Walk {
        root: from.to_path_buf(),
        source,
      })?;
      // min_depth(1) guarantees every entry lives under the walk root
      let Ok(relative) = entry.path().strip_prefix(from) else {
        continue;
      };
      let dest = to.join(relative);

      if entry.file_type().is_dir() {
        create_dir_all(&dest)?;
      } else {
        copy_file(entry.path(), &dest)?;
        copied += 1;
      }
    }
    Ok(copied)
  }

  fn is_excluded(&self, path: &Path) -> bool {
    path
      .file_name()
      .and_then(|name| name.to_str())
      .is_some_and(|name| self.exclude_patterns.contains(name))
  }
}

fn create_dir_all(path: &Path) -> Result<(), PackageError> {
  std::fs::create_dir_all(path).map_err(|source| PackageError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

fn copy_file(from: &Path, to: &Path) -> Result<(), PackageError> {
  std::fs::copy(from, to).map(|_| ()).map_err(|source| PackageError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  })
}
