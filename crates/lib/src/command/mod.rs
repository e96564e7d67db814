//! External command invocations.
//!
//! A [`CommandInvocation`] accumulates a program, an ordered argument vector,
//! a working directory and environment overrides, then runs exactly once
//! through an [`Executor`]. Arguments are handed to the OS as a vector: no
//! shell is involved, nothing is quoted, reordered or deduplicated.

mod executor;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::toolchain::CommandPrefix;

pub use executor::{Executor, ProcessExecutor};

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The program could not be started at all.
  #[error("failed to start {program} in {}: {source}", cwd.display())]
  Spawn {
    program: String,
    cwd: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully. `code` is `None` when it was
  /// killed by a signal.
  #[error("command failed ({}): {command} (in {})", describe_exit(*code), cwd.display())]
  Failed {
    command: String,
    cwd: PathBuf,
    code: Option<i32>,
  },
}

fn describe_exit(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "terminated by signal".to_string(),
  }
}

/// Frozen description of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  label: String,
  program: PathBuf,
  arguments: Vec<String>,
  working_directory: PathBuf,
  environment_overrides: BTreeMap<String, String>,
}

impl CommandSpec {
  /// Short name used in stage results and logs.
  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn arguments(&self) -> &[String] {
    &self.arguments
  }

  pub fn working_directory(&self) -> &Path {
    &self.working_directory
  }

  /// Variables set on top of the inherited environment.
  pub fn environment_overrides(&self) -> &BTreeMap<String, String> {
    &self.environment_overrides
  }
}

/// Program and arguments separated by single spaces, for diagnostics only.
impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.arguments {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}

/// Outcome of a successful command or pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
  pub stage_name: String,
  pub exit_code: i32,
  pub duration: Duration,
}

impl StageResult {
  pub fn new(stage_name: impl Into<String>, exit_code: i32, duration: Duration) -> Self {
    Self {
      stage_name: stage_name.into(),
      exit_code,
      duration,
    }
  }

  pub fn is_success(&self) -> bool {
    self.exit_code == 0
  }
}

/// Builder for a single external command.
#[derive(Debug, Clone)]
#[must_use]
pub struct CommandInvocation {
  spec: CommandSpec,
}

impl CommandInvocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    let program = program.into();
    let label = program
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| program.to_string_lossy().into_owned());

    Self {
      spec: CommandSpec {
        label,
        program,
        arguments: Vec::new(),
        working_directory: PathBuf::from("."),
        environment_overrides: BTreeMap::new(),
      },
    }
  }

  /// Start from a program plus its fixed leading arguments.
  pub fn from_prefix(prefix: &CommandPrefix) -> Self {
    Self::new(prefix.program()).with_arguments(prefix.args().iter().cloned())
  }

  /// Append one argument after all previously added ones.
  pub fn with_argument(mut self, arg: impl Into<String>) -> Self {
    self.spec.arguments.push(arg.into());
    self
  }

  pub fn with_arguments<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.spec.arguments.extend(args.into_iter().map(Into::into));
    self
  }

  /// Append a path argument.
  pub fn with_path(self, path: &Path) -> Self {
    self.with_argument(path.to_string_lossy().into_owned())
  }

  pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.spec.environment_overrides.insert(key.into(), value.into());
    self
  }

  pub fn with_envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
    for (key, value) in vars {
      self.spec.environment_overrides.insert(key.clone(), value.clone());
    }
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.spec.working_directory = dir.into();
    self
  }

  pub fn labelled(mut self, label: impl Into<String>) -> Self {
    self.spec.label = label.into();
    self
  }

  pub fn spec(&self) -> &CommandSpec {
    &self.spec
  }

  pub fn into_spec(self) -> CommandSpec {
    self.spec
  }

  /// Spawn the command as a child process and wait for it.
  ///
  /// # Errors
  ///
  /// [`CommandError::Spawn`] if the program cannot be started,
  /// [`CommandError::Failed`] if it exits unsuccessfully.
  pub fn run(self) -> Result<StageResult, CommandError> {
    self.run_with(&mut ProcessExecutor)
  }

  /// Run through the given executor.
  pub fn run_with<E: Executor + ?Sized>(self, executor: &mut E) -> Result<StageResult, CommandError> {
    let spec = self.spec;
    info!(cwd = %spec.working_directory.display(), cmd = %spec, "running command");
    if !spec.environment_overrides.is_empty() {
      debug!(env = ?spec.environment_overrides, "environment overrides");
    }
    executor.execute(&spec)
  }
}
