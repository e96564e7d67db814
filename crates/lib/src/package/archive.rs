use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::result::ZipError;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::PackageError;

/// Write every entry under `root` into a new zip at `output`.
///
/// Returns the number of files written. Entry timestamps are pinned to the
/// zip epoch so identical trees produce identical archives.
pub(super) fn write_zip(root: &Path, output: &Path) -> Result<usize, PackageError> {
  let archive_err = |source: ZipError| PackageError::Archive {
    path: output.to_path_buf(),
    source,
  };

  let mut entries = Vec::new();
  for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|source| PackageError::Walk {
      root: root.to_path_buf(),
      source,
    })?;
    entries.push(entry);
  }
  if !entries.iter().any(|entry| entry.file_type().is_file()) {
    return Err(PackageError::EmptyStaging { path: root.to_path_buf() });
  }

  let file = File::create(output).map_err(|source| archive_err(source.into()))?;
  let mut zip = ZipWriter::new(BufWriter::new(file));
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .compression_level(Some(9))
    .last_modified_time(DateTime::default());

  let mut files = 0;
  for entry in &entries {
    let Ok(relative) = entry.path().strip_prefix(root) else {
      continue;
    };
    let name = entry_name(relative);

    if entry.file_type().is_dir() {
      zip.add_directory(name, options).map_err(archive_err)?;
      continue;
    }

    let entry_options = match permissions(entry.path()) {
      Some(mode) => options.unix_permissions(mode),
      None => options,
    };
    zip.start_file(name, entry_options).map_err(archive_err)?;
    let mut source = File::open(entry.path()).map_err(|source| archive_err(source.into()))?;
    io::copy(&mut source, &mut zip).map_err(|source| archive_err(source.into()))?;
    files += 1;
  }

  zip.finish().map_err(archive_err)?;
  Ok(files)
}

/// Zip entry names always use `/`, whatever the host separator.
fn entry_name(relative: &Path) -> String {
  relative
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part.to_string_lossy()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(unix)]
fn permissions(path: &Path) -> Option<u32> {
  use std::os::unix::fs::PermissionsExt;
  std::fs::metadata(path).ok().map(|meta| meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(_path: &Path) -> Option<u32> {
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entry_names_use_forward_slashes() {
    let relative: std::path::PathBuf = ["META-INF", "com", "google"].iter().collect();
    assert_eq!(entry_name(&relative), "META-INF/com/google");
  }
}
