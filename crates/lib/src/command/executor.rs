use std::process::Command;
use std::time::Instant;

use tracing::debug;

use super::{CommandError, CommandSpec, StageResult};

/// Runs frozen [`CommandSpec`]s.
///
/// The pipeline only ever talks to this trait, so tests can substitute an
/// executor that records commands instead of spawning them.
pub trait Executor {
  fn execute(&mut self, spec: &CommandSpec) -> Result<StageResult, CommandError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
  fn execute(&mut self, spec: &CommandSpec) -> Result<StageResult, CommandError> {
    (**self).execute(spec)
  }
}

/// Spawns real child processes, blocking until each exits.
///
/// Standard streams are inherited so compiler output reaches the terminal as
/// it is produced. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
  fn execute(&mut self, spec: &CommandSpec) -> Result<StageResult, CommandError> {
    let start = Instant::now();

    let status = Command::new(spec.program())
      .args(spec.arguments())
      .envs(spec.environment_overrides())
      .current_dir(spec.working_directory())
      .status()
      .map_err(|source| CommandError::Spawn {
        program: spec.program().to_string_lossy().into_owned(),
        cwd: spec.working_directory().to_path_buf(),
        source,
      })?;

    let duration = start.elapsed();
    debug!(label = spec.label(), status = %status, duration = ?duration, "command exited");

    if !status.success() {
      return Err(CommandError::Failed {
        command: spec.to_string(),
        cwd: spec.working_directory().to_path_buf(),
        code: status.code(),
      });
    }

    Ok(StageResult::new(spec.label(), 0, duration))
  }
}
