//! Test utilities for ndkpack-lib.
//!
//! [`ScriptedExecutor`] stands in for real processes so pipeline tests can
//! assert on the exact commands dispatched and inject failures.

use std::path::Path;
use std::time::Duration;

use crate::command::{CommandError, CommandSpec, Executor, StageResult};

/// Records every command instead of spawning it.
///
/// Commands whose rendered command line contains a registered pattern fail
/// with the registered exit code; everything else succeeds.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
  specs: Vec<CommandSpec>,
  failures: Vec<(String, i32)>,
}

impl ScriptedExecutor {
  pub fn failing_on(pattern: &str, code: i32) -> Self {
    Self {
      specs: Vec::new(),
      failures: vec![(pattern.to_string(), code)],
    }
  }

  pub fn specs(&self) -> &[CommandSpec] {
    &self.specs
  }

  /// Rendered command lines, in dispatch order.
  pub fn commands(&self) -> Vec<String> {
    self.specs.iter().map(ToString::to_string).collect()
  }
}

impl Executor for ScriptedExecutor {
  fn execute(&mut self, spec: &CommandSpec) -> Result<StageResult, CommandError> {
    self.specs.push(spec.clone());
    let rendered = spec.to_string();

    if let Some((_, code)) = self.failures.iter().find(|(pattern, _)| rendered.contains(pattern.as_str())) {
      return Err(CommandError::Failed {
        command: rendered,
        cwd: spec.working_directory().to_path_buf(),
        code: Some(*code),
      });
    }

    Ok(StageResult::new(spec.label(), 0, Duration::ZERO))
  }
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}
