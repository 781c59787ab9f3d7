//! Platform process access.
//!
//! One trait pair, one concrete implementation per OS. Everything above
//! this module is written once against the traits; only the leaf modules
//! talk to OS APIs.

#[cfg(test)]
pub mod mock;
#[cfg(target_os = "linux")]
mod procfs;
#[cfg(target_os = "windows")]
mod toolhelp;

use std::path::PathBuf;

use crate::error::Result;

/// One module loaded inside a process: where it is mapped, and where its
/// backing image lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub base_address: u64,
    pub path: PathBuf,
}

/// Locates a running process by executable file name and attaches to it
/// with enough access to write its memory.
pub trait ProcessProvider {
    type Process: TargetProcess;

    /// Enumerate running processes and attach to the first one whose
    /// executable file name equals `executable` (exact, case-sensitive).
    ///
    /// Errors distinguish "enumeration completed, nothing matched"
    /// ([`crate::Error::ProcessNotFound`]) from the enumeration itself
    /// failing ([`crate::Error::EnumerationFailed`]).
    fn attach(&self, executable: &str) -> Result<Self::Process>;
}

/// An attached process. The OS attachment (handle, tracer relationship)
/// is released when the value is dropped, on every exit path.
pub trait TargetProcess {
    fn pid(&self) -> u32;

    /// Enumerate the modules mapped into the process and return the one
    /// whose file name equals `name` (exact match).
    fn find_module(&self, name: &str) -> Result<ModuleInfo>;

    /// Write `bytes` verbatim at `address` in the process's address space.
    /// A short write is an error; no rollback is attempted.
    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()>;
}

#[cfg(target_os = "linux")]
pub use procfs::{ProcfsProcess, ProcfsProvider};
#[cfg(target_os = "windows")]
pub use toolhelp::{ToolhelpProcess, ToolhelpProvider};

/// The provider for the host platform.
#[cfg(target_os = "linux")]
pub type NativeProvider = ProcfsProvider;
#[cfg(target_os = "windows")]
pub type NativeProvider = ToolhelpProvider;
