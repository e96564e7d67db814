use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{BuildPipeline, PipelineError, Stage};
use crate::command::{CommandInvocation, Executor, StageResult};
use crate::consts::{CARGO_MANIFEST, OUTPUT_DIR};
use crate::package::{ArtifactManifest, ArtifactPackager, PackageError, archive_file_name};
use crate::project::{NativeConfig, ProjectLayout};
use crate::request::{Action, BuildRequest};
use crate::util::{list_files, remove_dir_if_exists};

/// Optimisation and linker flags for the native shared library.
pub(crate) const NATIVE_LINK_FLAGS: &[&str] = &[
  "-Ofast",
  "-flto",
  "-fmerge-all-constants",
  "-fno-exceptions",
  "-fomit-frame-pointer",
  "-fshort-enums",
  "-Wl,-O3,--lto-O3,--gc-sections,--as-needed,--icf=all,-z,norelro,--pack-dyn-relocs=android+relr",
  "-std=c++2b",
  "-Wall",
  "-lc++",
];

impl<'a, E: Executor> BuildPipeline<'a, E> {
  pub(super) fn clean(&mut self) -> Result<(), PipelineError> {
    let stage = Stage::Clean;
    let layout: &'a ProjectLayout = self.layout;

    remove_dir(stage, &layout.output_dir())?;
    self.cargo_clean(layout.root())?;

    if let Some(native) = layout.native() {
      remove_dir(stage, &native.output_dir())?;
      self.cargo_clean(&native.crate_dir())?;
    }

    Ok(())
  }

  /// `cargo clean` in `dir`, skipped when `dir` holds no cargo manifest.
  fn cargo_clean(&mut self, dir: &Path) -> Result<(), PipelineError> {
    if !dir.join(CARGO_MANIFEST).is_file() {
      debug!(path = %dir.display(), "no Cargo.toml, skipping cargo clean");
      return Ok(());
    }
    let cargo = CommandInvocation::new(self.toolchain.cargo())
      .with_argument("clean")
      .current_dir(dir);
    self.invoke(Stage::Clean, cargo)?;
    Ok(())
  }

  /// Build the native crate, link it into a shared library and strip it.
  /// In check mode only the crate is checked.
  pub(super) fn native_component(&mut self, request: &BuildRequest) -> Result<(), PipelineError> {
    let stage = Stage::NativeComponent;
    let Some(native) = self.requested_native(request) else {
      return Ok(());
    };

    let check = request.action() == Action::Check;
    let cargo = self.cargo_invocation(request, if check { "check" } else { "build" }, &native.crate_dir());
    self.invoke(stage, cargo)?;
    if check {
      return Ok(());
    }

    let built = native.built_static_lib(request.variant());
    if !built.is_file() {
      return Err(PipelineError::MissingArtifact {
        stage,
        what: "native static library",
        path: built,
      });
    }

    let output_dir = native.output_dir();
    fs::create_dir_all(&output_dir).map_err(|source| PipelineError::Filesystem {
      stage,
      source: PackageError::CreateDir {
        path: output_dir.clone(),
        source,
      },
    })?;
    let copied = output_dir.join(native.static_lib_name());
    fs::copy(&built, &copied).map_err(|source| PipelineError::Filesystem {
      stage,
      source: PackageError::Copy {
        from: built.clone(),
        to: copied.clone(),
        source,
      },
    })?;

    let sources_dir = native.sources_dir();
    let sources = list_files(&sources_dir, &["cpp"]).map_err(|source| PipelineError::Filesystem {
      stage,
      source: PackageError::Walk {
        root: sources_dir.clone(),
        source,
      },
    })?;
    if sources.is_empty() {
      return Err(PipelineError::MissingArtifact {
        stage,
        what: "native sources",
        path: sources_dir,
      });
    }

    let relative: Vec<&Path> = sources
      .iter()
      .map(|source| source.strip_prefix(native.dir()).unwrap_or(source))
      .collect();
    let link = link_invocation(self.toolchain.native_compiler(), native.config(), &relative).current_dir(native.dir());
    self.invoke(stage, link)?;

    self.strip(stage, &native.shared_lib())
  }

  /// `cargo build` or `cargo check` of the main binary for the target.
  pub(super) fn cross_binary(&mut self, request: &BuildRequest, stage: Stage) -> Result<(), PipelineError> {
    let layout: &'a ProjectLayout = self.layout;
    let subcommand = if stage == Stage::Check { "check" } else { "build" };

    let mut cargo = self.cargo_invocation(request, subcommand, layout.root());
    if !request.feature_flags().is_empty() {
      let features: Vec<&str> = request.feature_flags().iter().map(String::as_str).collect();
      cargo = cargo.with_argument("--features").with_argument(features.join(","));
    }
    if request.no_default_features() {
      cargo = cargo.with_argument("--no-default-features");
    }

    let rustflags = &layout.config().cross.rustflags;
    if !rustflags.is_empty() {
      cargo = cargo.with_env("RUSTFLAGS", rustflags.join(" "));
    }

    self.invoke(stage, cargo)?;
    Ok(())
  }

  pub(super) fn staging(&mut self, request: &BuildRequest, timestamp: DateTime<Utc>) -> Result<(), PipelineError> {
    let stage = Stage::Staging;
    let binary = self.layout.binary_path(request.variant());
    if !binary.is_file() {
      return Err(PipelineError::MissingArtifact {
        stage,
        what: "cross-compiled binary",
        path: binary,
      });
    }

    let mut manifest = self.manifest(request, timestamp);
    if let Some((webroot, stage_as)) = self.webui()? {
      manifest = manifest.inject_dir(webroot, stage_as);
    }
    ArtifactPackager::for_manifest(&manifest)
      .assemble(&manifest)
      .map_err(|source| PipelineError::Filesystem { stage, source })?;

    info!(path = %manifest.staging_root.display(), "staged package");
    Ok(())
  }

  /// Build the web UI, if any, and return its output tree with the staged
  /// destination. Commands run in order and the first failure stops the run.
  fn webui(&mut self) -> Result<Option<(PathBuf, PathBuf)>, PipelineError> {
    let stage = Stage::Staging;
    let layout: &'a ProjectLayout = self.layout;
    let Some((config, dir, output)) = layout.webui() else {
      return Ok(None);
    };

    for command in &config.commands {
      let Some((program, arguments)) = command.split_first() else {
        continue;
      };
      let invocation = CommandInvocation::new(program)
        .labelled("build web ui")
        .with_arguments(arguments)
        .current_dir(&dir);
      self.invoke(stage, invocation)?;
    }

    if !output.is_dir() {
      return Err(PipelineError::MissingArtifact {
        stage,
        what: "web ui output",
        path: output,
      });
    }
    debug!(path = %output.display(), "built web ui");
    Ok(Some((output, config.stage_as.clone())))
  }

  pub(super) fn strip_staged(&mut self, request: &BuildRequest) -> Result<(), PipelineError> {
    let layout: &'a ProjectLayout = self.layout;
    let staged = layout
      .staging_root(request.variant())
      .join(&layout.config().package.binary);
    self.strip(Stage::Stripping, &staged)
  }

  pub(super) fn archive(&mut self, request: &BuildRequest, timestamp: DateTime<Utc>) -> Result<PathBuf, PipelineError> {
    let manifest = self.manifest(request, timestamp);
    ArtifactPackager::for_manifest(&manifest)
      .archive(&manifest.staging_root, &manifest.output_archive_path)
      .map_err(|source| PipelineError::Filesystem {
        stage: Stage::Archiving,
        source,
      })
  }

  /// What goes into the package for this request.
  fn manifest(&self, request: &BuildRequest, timestamp: DateTime<Utc>) -> ArtifactManifest {
    let layout: &'a ProjectLayout = self.layout;
    let config = layout.config();
    let variant = request.variant();

    let template = layout.template_dir(config.template_for(request.feature_flags()));
    let archive = layout
      .output_dir()
      .join(archive_file_name(&config.package.name, variant, timestamp));

    let mut manifest = ArtifactManifest::new(template, layout.staging_root(variant), archive)
      .inject(layout.binary_path(variant), PathBuf::from(&config.package.binary))
      .exclude(config.template.ignore.iter().cloned());

    if let Some(native) = self.requested_native(request) {
      manifest = manifest.inject(native.shared_lib(), native.config().stage_as.clone());
    }

    manifest
  }

  fn cargo_invocation(&self, request: &BuildRequest, subcommand: &str, dir: &Path) -> CommandInvocation {
    let triple = &self.layout.config().target.triple;
    let mut cargo = CommandInvocation::from_prefix(self.toolchain.cross_compiler_for(request.use_nightly()))
      .labelled(format!("cargo {subcommand}"))
      .current_dir(dir)
      .with_argument(subcommand)
      .with_arguments(["--target", triple.as_str()]);

    if request.use_nightly() {
      cargo = cargo.with_arguments(["-Z", "build-std"]);
      if request.variant().is_release() {
        cargo = cargo.with_arguments(["-Z", "trim-paths"]);
      }
    }
    if request.variant().is_release() {
      cargo = cargo.with_argument("--release");
    }
    if request.verbose() {
      cargo = cargo.with_argument("--verbose");
    }

    cargo
  }

  fn strip(&mut self, stage: Stage, path: &Path) -> Result<(), PipelineError> {
    let strip = CommandInvocation::new(self.toolchain.stripper())
      .labelled("strip")
      .current_dir(self.layout.root())
      .with_path(path);
    self.invoke(stage, strip)?;
    Ok(())
  }

  /// Run one command with the toolchain's extra environment applied.
  fn invoke(&mut self, stage: Stage, invocation: CommandInvocation) -> Result<StageResult, PipelineError> {
    invocation
      .with_envs(self.toolchain.extra_env())
      .run_with(&mut self.executor)
      .map_err(|source| PipelineError::Command { stage, source })
  }
}

/// `clang++ --shared <sources> ... -o output/<lib>`, run from the component directory.
fn link_invocation(compiler: &Path, config: &NativeConfig, sources: &[&Path]) -> CommandInvocation {
  let mut link = CommandInvocation::new(compiler)
    .labelled("link native library")
    .with_argument("--shared");
  for source in sources {
    link = link.with_path(source);
  }

  link = link
    .with_argument("-I")
    .with_path(&config.include)
    .with_argument("-L")
    .with_argument(OUTPUT_DIR);
  for search in &config.link_search {
    link = link.with_argument("-L").with_path(search);
  }

  let libs: Vec<String> = std::iter::once(&config.static_lib)
    .chain(&config.link_libs)
    .map(|lib| format!("-l{lib}"))
    .collect();

  link
    .with_arguments(["-fPIC", "-nostdlib++"])
    .with_argument(format!("-Wl,{}", libs.join(",")))
    .with_arguments(NATIVE_LINK_FLAGS.iter().copied())
    .with_argument("-o")
    .with_path(&Path::new(OUTPUT_DIR).join(&config.output))
    .with_argument("-Wl,--threads=1")
}

fn remove_dir(stage: Stage, path: &Path) -> Result<(), PipelineError> {
  match remove_dir_if_exists(path) {
    Ok(removed) => {
      debug!(path = %path.display(), removed, "cleared directory");
      Ok(())
    }
    Err(source) => Err(PipelineError::Filesystem {
      stage,
      source: PackageError::Remove {
        path: path.to_path_buf(),
        source,
      },
    }),
  }
}
