//! Shared utilities.
//!
//! Filesystem helpers used by cleaning and packaging, plus test helpers.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove a directory tree, treating "already absent" as success.
///
/// Returns `true` if something was removed.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => Ok(true),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(err) => Err(err),
  }
}

/// Files directly inside `dir` whose extension is one of `extensions`, in name order.
///
/// An empty `extensions` slice matches every file.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<std::path::PathBuf>, walkdir::Error> {
  let mut files = Vec::new();
  for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let matches = extensions.is_empty()
      || entry
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext));
    if matches {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

#[cfg(test)]
pub mod testutil;

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn removing_absent_directory_succeeds() {
    let temp = TempDir::new().unwrap();
    assert!(!remove_dir_if_exists(&temp.path().join("output")).unwrap());
  }

  #[test]
  fn removing_existing_tree() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("output");
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(dir.join("nested").join("file"), "x").unwrap();

    assert!(remove_dir_if_exists(&dir).unwrap());
    assert!(!dir.exists());
  }

  #[cfg(unix)]
  #[test]
  fn removing_a_file_path_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("output");
    std::fs::write(&file, "not a dir").unwrap();

    assert!(remove_dir_if_exists(&file).is_err());
  }

  #[test]
  fn list_files_filters_and_sorts() {
    let temp = TempDir::new().unwrap();
    for name in ["b.cpp", "a.cpp", "main.h", "notes.txt"] {
      std::fs::write(temp.path().join(name), "").unwrap();
    }
    std::fs::create_dir(temp.path().join("c.cpp")).unwrap();

    let cpp = list_files(temp.path(), &["cpp"]).unwrap();
    assert_eq!(cpp, [temp.path().join("a.cpp"), temp.path().join("b.cpp")]);

    let sources = list_files(temp.path(), &["cpp", "h"]).unwrap();
    assert_eq!(sources.len(), 3);

    assert_eq!(list_files(temp.path(), &[]).unwrap().len(), 4);
  }
}
