//! The build pipeline.
//!
//! A [`BuildPipeline`] runs a fixed, totally ordered list of [`Stage`]s for
//! one [`BuildRequest`]:
//!
//! ```text
//! clean:  Idle -> Cleaning -> Done
//! check:  Idle -> [BuildingNativeComponent] -> Checking -> Done
//! build:  Idle -> [BuildingNativeComponent] -> BuildingCrossBinary
//!              -> Staging -> Stripping -> Archiving -> Done
//! ```
//!
//! The native component stage only runs when the request enables the
//! component's trigger feature. Staging also builds the web UI when the
//! manifest declares one. The first error moves the pipeline to
//! [`PipelineState::Failed`] and nothing after it runs. Staging trees from a
//! failed run stay on disk.

mod stages;

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::command::{CommandError, Executor, StageResult};
use crate::package::PackageError;
use crate::project::{NativeLayout, ProjectLayout};
use crate::request::{Action, BuildRequest};
use crate::toolchain::ToolchainProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  Clean,
  NativeComponent,
  CrossBinary,
  Check,
  Staging,
  Stripping,
  Archiving,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Clean => "clean",
      Self::NativeComponent => "native-component",
      Self::CrossBinary => "cross-binary",
      Self::Check => "check",
      Self::Staging => "staging",
      Self::Stripping => "stripping",
      Self::Archiving => "archiving",
    }
  }

  /// State the pipeline is in while this stage runs.
  pub fn state(&self) -> PipelineState {
    match self {
      Self::Clean => PipelineState::Cleaning,
      Self::NativeComponent => PipelineState::BuildingNativeComponent,
      Self::CrossBinary => PipelineState::BuildingCrossBinary,
      Self::Check => PipelineState::Checking,
      Self::Staging => PipelineState::Staging,
      Self::Stripping => PipelineState::Stripping,
      Self::Archiving => PipelineState::Archiving,
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Idle,
  Cleaning,
  BuildingNativeComponent,
  BuildingCrossBinary,
  Checking,
  Staging,
  Stripping,
  Archiving,
  Done,
  Failed(Stage),
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("{stage} stage failed")]
  Command {
    stage: Stage,
    #[source]
    source: CommandError,
  },

  #[error("{stage} stage failed")]
  Filesystem {
    stage: Stage,
    #[source]
    source: PackageError,
  },

  #[error("{stage} stage failed: {what} not found at {}", path.display())]
  MissingArtifact {
    stage: Stage,
    what: &'static str,
    path: PathBuf,
  },
}

impl PipelineError {
  /// The stage that failed.
  pub fn stage(&self) -> Stage {
    match self {
      Self::Command { stage, .. } | Self::Filesystem { stage, .. } | Self::MissingArtifact { stage, .. } => *stage,
    }
  }
}

/// Results of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
  pub results: Vec<StageResult>,
  /// The archive written by the archiving stage, if it ran.
  pub archive: Option<PathBuf>,
}

impl PipelineReport {
  pub fn total_duration(&self) -> Duration {
    self.results.iter().map(|result| result.duration).sum()
  }
}

pub struct BuildPipeline<'a, E> {
  toolchain: &'a ToolchainProfile,
  layout: &'a ProjectLayout,
  executor: E,
  timestamp: Option<DateTime<Utc>>,
  state: PipelineState,
}

impl<'a, E: Executor> BuildPipeline<'a, E> {
  pub fn new(toolchain: &'a ToolchainProfile, layout: &'a ProjectLayout, executor: E) -> Self {
    Self {
      toolchain,
      layout,
      executor,
      timestamp: None,
      state: PipelineState::Idle,
    }
  }

  /// Pin the timestamp embedded in archive names instead of using the clock.
  #[must_use]
  pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
    self.timestamp = Some(timestamp);
    self
  }

  pub fn state(&self) -> PipelineState {
    self.state
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  /// Stages `request` will go through, in order.
  pub fn plan(&self, request: &BuildRequest) -> Vec<Stage> {
    let native = self.requested_native(request).is_some();
    let mut stages = Vec::new();

    match request.action() {
      Action::Clean => stages.push(Stage::Clean),
      Action::Check => {
        if native {
          stages.push(Stage::NativeComponent);
        }
        stages.push(Stage::Check);
      }
      Action::Build => {
        if native {
          stages.push(Stage::NativeComponent);
        }
        stages.extend([Stage::CrossBinary, Stage::Staging, Stage::Stripping, Stage::Archiving]);
      }
    }

    stages
  }

  /// Run every planned stage, stopping at the first failure.
  ///
  /// # Errors
  ///
  /// Returns the first stage error; the pipeline is then in
  /// [`PipelineState::Failed`].
  pub fn run(&mut self, request: &BuildRequest) -> Result<PipelineReport, PipelineError> {
    let stages = self.plan(request);
    let timestamp = self.timestamp.unwrap_or_else(Utc::now);
    let mut report = PipelineReport::default();

    info!(
      action = %request.action(),
      variant = %request.variant(),
      nightly = request.use_nightly(),
      stages = stages.len(),
      "starting pipeline"
    );

    for stage in stages {
      self.state = stage.state();
      info!(stage = %stage, "entering stage");
      let start = Instant::now();

      let outcome = match stage {
        Stage::Clean => self.clean(),
        Stage::NativeComponent => self.native_component(request),
        Stage::CrossBinary | Stage::Check => self.cross_binary(request, stage),
        Stage::Staging => self.staging(request, timestamp),
        Stage::Stripping => self.strip_staged(request),
        Stage::Archiving => self.archive(request, timestamp).map(|path| report.archive = Some(path)),
      };

      if let Err(err) = outcome {
        self.state = PipelineState::Failed(stage);
        error!(stage = %stage, "stage failed, aborting pipeline");
        return Err(err);
      }

      let result = StageResult::new(stage.as_str(), 0, start.elapsed());
      info!(stage = %stage, duration = ?result.duration, "stage finished");
      report.results.push(result);
    }

    self.state = PipelineState::Done;
    Ok(report)
  }

  /// The native component, if the manifest declares one and the request enables it.
  fn requested_native(&self, request: &BuildRequest) -> Option<NativeLayout<'a>> {
    let layout: &'a ProjectLayout = self.layout;
    layout
      .native()
      .filter(|native| request.has_feature(&native.config().feature))
  }
}
