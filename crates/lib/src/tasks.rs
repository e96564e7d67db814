//! Maintenance tasks run against the project and its native crate:
//! formatting, linting and dependency updates.
//!
//! Like the build pipeline, every task stops at the first failing command.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::command::{CommandError, CommandInvocation, Executor, StageResult};
use crate::project::{NativeLayout, ProjectLayout};
use crate::request::Variant;
use crate::toolchain::ToolchainProfile;
use crate::util::list_files;

const NATIVE_SOURCE_EXTENSIONS: &[&str] = &["cpp", "h", "hpp"];

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("{task} failed")]
  Command {
    task: &'static str,
    #[source]
    source: CommandError,
  },

  #[error("failed to list native sources in {}: {source}", dir.display())]
  Sources { dir: PathBuf, source: walkdir::Error },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintOptions {
  /// Apply clippy suggestions in place.
  pub fix: bool,
  /// Also run the static analyzer over the native sources.
  pub tidy: bool,
}

pub struct Tasks<'a, E> {
  toolchain: &'a ToolchainProfile,
  layout: &'a ProjectLayout,
  executor: E,
}

impl<'a, E: Executor> Tasks<'a, E> {
  pub fn new(toolchain: &'a ToolchainProfile, layout: &'a ProjectLayout, executor: E) -> Self {
    Self {
      toolchain,
      layout,
      executor,
    }
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  /// `cargo fmt` in every crate, then the C++ formatter over the native sources.
  pub fn format(&mut self, verbose: bool) -> Result<Vec<StageResult>, TaskError> {
    let mut results = Vec::new();

    for dir in self.crate_dirs() {
      let mut fmt = CommandInvocation::new(self.toolchain.cargo())
        .with_arguments(["fmt", "--all"])
        .current_dir(dir);
      if verbose {
        fmt = fmt.with_argument("--verbose");
      }
      results.push(self.run("format", fmt)?);
    }

    let layout: &'a ProjectLayout = self.layout;
    if let Some(native) = layout.native() {
      let sources = native_sources(&native, NATIVE_SOURCE_EXTENSIONS)?;
      if sources.is_empty() {
        warn!(dir = %native.sources_dir().display(), "no native sources to format");
      } else {
        let mut formatter = CommandInvocation::new(self.toolchain.formatter())
          .with_arguments(["-i", "--verbose"])
          .current_dir(native.dir());
        for source in &sources {
          formatter = formatter.with_path(source);
        }
        results.push(self.run("format", formatter)?);
      }
    }

    info!(commands = results.len(), "formatted sources");
    Ok(results)
  }

  /// Clippy for the target in debug and release, for every crate.
  pub fn lint(&mut self, options: LintOptions) -> Result<Vec<StageResult>, TaskError> {
    let layout: &'a ProjectLayout = self.layout;
    let triple = &layout.config().target.triple;
    let mut results = Vec::new();

    for dir in self.crate_dirs() {
      for variant in [Variant::Debug, Variant::Release] {
        let mut clippy = CommandInvocation::from_prefix(self.toolchain.cross_compiler())
          .labelled(format!("clippy {variant}"))
          .current_dir(&dir)
          .with_argument("clippy");
        if options.fix {
          clippy = clippy.with_arguments(["--fix", "--allow-dirty", "--allow-staged"]);
        }
        clippy = clippy.with_arguments(["--target", triple.as_str()]);
        if variant.is_release() {
          clippy = clippy.with_argument("--release");
        }
        results.push(self.run("lint", clippy)?);
      }
    }

    if options.tidy {
      match layout.native() {
        Some(native) => results.extend(self.tidy(&native)?),
        None => warn!("no native component configured, skipping static analysis"),
      }
    }

    Ok(results)
  }

  /// `cargo update --recursive` for every crate.
  pub fn update(&mut self) -> Result<Vec<StageResult>, TaskError> {
    let mut results = Vec::new();
    for dir in self.crate_dirs() {
      let update = CommandInvocation::new(self.toolchain.cargo())
        .with_arguments(["update", "--recursive"])
        .current_dir(dir);
      results.push(self.run("update", update)?);
    }
    Ok(results)
  }

  fn tidy(&mut self, native: &NativeLayout<'_>) -> Result<Option<StageResult>, TaskError> {
    let sources = native_sources(native, &["cpp"])?;
    if sources.is_empty() {
      warn!(dir = %native.sources_dir().display(), "no native sources to analyze");
      return Ok(None);
    }

    let mut tidy = CommandInvocation::new(self.toolchain.static_analyzer()).current_dir(native.dir());
    for source in &sources {
      tidy = tidy.with_path(source);
    }
    let tidy = tidy
      .with_arguments(["--", "-I"])
      .with_path(&native.config().include)
      .with_argument("-std=c++2b");

    self.run("lint", tidy).map(Some)
  }

  /// The project root, plus the native crate when it exists on disk.
  fn crate_dirs(&self) -> Vec<PathBuf> {
    let mut dirs = vec![self.layout.root().to_path_buf()];
    if let Some(native) = self.layout.native() {
      let crate_dir = native.crate_dir();
      if crate_dir.is_dir() {
        dirs.push(crate_dir);
      }
    }
    dirs
  }

  fn run(&mut self, task: &'static str, invocation: CommandInvocation) -> Result<StageResult, TaskError> {
    invocation
      .with_envs(self.toolchain.extra_env())
      .run_with(&mut self.executor)
      .map_err(|source| TaskError::Command { task, source })
  }
}

/// Native sources with the given extensions, relative to the component directory.
fn native_sources(native: &NativeLayout<'_>, extensions: &[&str]) -> Result<Vec<PathBuf>, TaskError> {
  let dir = native.sources_dir();
  let files = list_files(&dir, extensions).map_err(|source| TaskError::Sources {
    dir: dir.clone(),
    source,
  })?;
  Ok(
    files
      .into_iter()
      .map(|file| relative_to(&file, native.dir()))
      .collect(),
  )
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
  path.strip_prefix(base).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::{CONFIG_FILE_NAME, TERMUX_SENTINEL_VAR};
  use crate::platform::HostEnvironment;
  use crate::toolchain::ToolchainResolver;
  use crate::util::testutil::{ScriptedExecutor, write_file};
  use tempfile::TempDir;

  fn termux_profile(layout: &ProjectLayout) -> ToolchainProfile {
    let host = HostEnvironment::new("aarch64", "android").with_var(TERMUX_SENTINEL_VAR, "0.118.0");
    ToolchainResolver::new(&host, &layout.config().target)
      .resolve()
      .unwrap()
  }

  fn native_project() -> (TempDir, ProjectLayout) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join(CONFIG_FILE_NAME), "[native]\n");
    write_file(&root.join("zygisk/rust/Cargo.toml"), "[package]\n");
    write_file(&root.join("zygisk/src/main.cpp"), "\n");
    write_file(&root.join("zygisk/src/hook.h"), "\n");
    write_file(&root.join("zygisk/src/notes.txt"), "\n");
    let layout = ProjectLayout::open(root).unwrap();
    (temp, layout)
  }

  #[cfg(unix)]
  #[test]
  fn format_covers_both_crates_and_native_sources() {
    let (_temp, layout) = native_project();
    let profile = termux_profile(&layout);
    let mut tasks = Tasks::new(&profile, &layout, ScriptedExecutor::default());

    let results = tasks.format(true).unwrap();

    assert_eq!(results.len(), 3);
    let specs = tasks.executor().specs();
    assert_eq!(
      tasks.executor().commands(),
      [
        "cargo fmt --all --verbose",
        "cargo fmt --all --verbose",
        "clang-format -i --verbose src/hook.h src/main.cpp",
      ]
    );
    assert_eq!(specs[0].working_directory(), layout.root());
    assert_eq!(specs[1].working_directory(), layout.root().join("zygisk/rust"));
    assert_eq!(specs[2].working_directory(), layout.root().join("zygisk"));
  }

  #[test]
  fn lint_runs_both_variants_per_crate() {
    let (_temp, layout) = native_project();
    let profile = termux_profile(&layout);
    let mut tasks = Tasks::new(&profile, &layout, ScriptedExecutor::default());

    tasks
      .lint(LintOptions {
        fix: true,
        tidy: false,
      })
      .unwrap();

    let fix = "cargo clippy --fix --allow-dirty --allow-staged --target aarch64-linux-android";
    assert_eq!(
      tasks.executor().commands(),
      [
        fix.to_string(),
        format!("{fix} --release"),
        fix.to_string(),
        format!("{fix} --release"),
      ]
    );
  }

  #[cfg(unix)]
  #[test]
  fn tidy_analyzes_cpp_sources_only() {
    let (_temp, layout) = native_project();
    let profile = termux_profile(&layout);
    let mut tasks = Tasks::new(&profile, &layout, ScriptedExecutor::default());

    tasks
      .lint(LintOptions {
        fix: false,
        tidy: true,
      })
      .unwrap();

    let commands = tasks.executor().commands();
    assert_eq!(commands.len(), 5);
    assert_eq!(commands[0], "cargo clippy --target aarch64-linux-android");
    assert_eq!(commands[4], "clang-tidy src/main.cpp -- -I rust/include -std=c++2b");
  }

  #[test]
  fn project_without_native_crate_touches_root_only() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::open(temp.path()).unwrap();
    let profile = termux_profile(&layout);
    let mut tasks = Tasks::new(&profile, &layout, ScriptedExecutor::default());

    tasks.update().unwrap();
    tasks
      .lint(LintOptions {
        fix: false,
        tidy: true,
      })
      .unwrap();

    assert_eq!(
      tasks.executor().commands(),
      [
        "cargo update --recursive",
        "cargo clippy --target aarch64-linux-android",
        "cargo clippy --target aarch64-linux-android --release",
      ]
    );
  }

  #[test]
  fn failing_command_stops_task() {
    let (_temp, layout) = native_project();
    let profile = termux_profile(&layout);
    let mut tasks = Tasks::new(&profile, &layout, ScriptedExecutor::failing_on("update", 101));

    let err = tasks.update().unwrap_err();

    assert!(matches!(
      err,
      TaskError::Command {
        task: "update",
        source: CommandError::Failed { code: Some(101), .. },
      }
    ));
    assert_eq!(tasks.executor().specs().len(), 1);
  }
}
