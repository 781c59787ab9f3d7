//! # sigpatch-core
//!
//! Core library for the sigpatch byte patcher.
//!
//! This crate provides:
//! - Process and module discovery (ToolHelp snapshots on Windows, procfs
//!   plus ptrace on Linux), behind one trait pair
//! - Wildcard byte-signature scanning over a module's on-disk image
//! - File-offset to virtual-address translation
//! - Single-shot patching of another process's memory
//!
//! The binary in `sigpatch-cli` is a thin shell over [`patch::execute`].

pub mod error;
pub mod image;
pub mod patch;
pub mod pattern;
pub mod process;
pub mod target;

pub use error::{Error, Result};
pub use image::ModuleImage;
pub use patch::{PatchPlan, PatchReport, apply_patch, execute, plan_patch, resolve_address};
pub use pattern::{BytePattern, format_pattern, parse_patch_bytes, parse_pattern};
pub use process::{ModuleInfo, ProcessProvider, TargetProcess};
pub use target::{PatchTarget, TargetSet, builtin_targets, load_targets, save_targets};

#[cfg(any(target_os = "windows", target_os = "linux"))]
pub use process::NativeProvider;
