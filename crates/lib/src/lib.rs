//! ndkpack-lib: build orchestration for Android NDK modules.
//!
//! - `toolchain`: locates the NDK and resolves the tools for the host
//! - `command`: argument-vector process invocations
//! - `pipeline`: clean, native component, cross binary, staging, stripping, archiving
//! - `package`: staged package trees and deterministic zip archives
//! - `tasks`: formatting, linting and dependency updates

pub mod command;
pub mod consts;
pub mod package;
pub mod pipeline;
pub mod platform;
pub mod project;
pub mod request;
pub mod tasks;
pub mod toolchain;
pub mod util;
