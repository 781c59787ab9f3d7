//! Windows backend: ToolHelp snapshots and `WriteProcessMemory`.

use std::ffi::c_void;
use std::path::PathBuf;

use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, ERROR_ACCESS_DENIED, HANDLE};
use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CREATE_TOOLHELP_SNAPSHOT_FLAGS, CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW,
    Module32NextW, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_WRITE,
};

use super::{ModuleInfo, ProcessProvider, TargetProcess};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct ToolhelpProvider;

impl ToolhelpProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProvider for ToolhelpProvider {
    type Process = ToolhelpProcess;

    fn attach(&self, executable: &str) -> Result<ToolhelpProcess> {
        let snapshot = Snapshot::new("processes", TH32CS_SNAPPROCESS, 0)?;

        let mut entry = PROCESSENTRY32W {
            dwSize: size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut next = unsafe { Process32FirstW(snapshot.0, &mut entry) };
        while next.is_ok() {
            if wide_str(&entry.szExeFile) == executable {
                debug!("matched {} (pid {})", executable, entry.th32ProcessID);
                return ToolhelpProcess::open(entry.th32ProcessID);
            }
            next = unsafe { Process32NextW(snapshot.0, &mut entry) };
        }

        Err(Error::ProcessNotFound(executable.to_string()))
    }
}

/// An open process handle with write access. Closed on drop.
pub struct ToolhelpProcess {
    pid: u32,
    handle: HANDLE,
}

impl ToolhelpProcess {
    fn open(pid: u32) -> Result<Self> {
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION | PROCESS_VM_OPERATION | PROCESS_VM_WRITE,
                false,
                pid,
            )
        }
        .map_err(|e| {
            if is_access_denied(&e) {
                Error::AccessDenied(format!("open process {}: {}", pid, e))
            } else {
                Error::ProcessOpenFailed(format!("pid {}: {}", pid, e))
            }
        })?;

        Ok(Self { pid, handle })
    }
}

impl TargetProcess for ToolhelpProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn find_module(&self, name: &str) -> Result<ModuleInfo> {
        // SNAPMODULE32 so 32-bit modules of a WOW64 process show up too.
        let snapshot = Snapshot::new(
            "modules",
            TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32,
            self.pid,
        )?;

        let mut entry = MODULEENTRY32W {
            dwSize: size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut next = unsafe { Module32FirstW(snapshot.0, &mut entry) };
        while next.is_ok() {
            if wide_str(&entry.szModule) == name {
                return Ok(ModuleInfo {
                    base_address: entry.modBaseAddr as usize as u64,
                    path: PathBuf::from(wide_str(&entry.szExePath)),
                });
            }
            next = unsafe { Module32NextW(snapshot.0, &mut entry) };
        }

        Err(Error::ModuleNotFound {
            pid: self.pid,
            name: name.to_string(),
        })
    }

    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut written = 0usize;
        unsafe {
            WriteProcessMemory(
                self.handle,
                address as usize as *const c_void,
                bytes.as_ptr() as *const c_void,
                bytes.len(),
                Some(&mut written),
            )
        }
        .map_err(|e| {
            if is_access_denied(&e) {
                Error::AccessDenied(format!("write at {:#x}: {}", address, e))
            } else {
                Error::MemoryWriteFailed {
                    address,
                    message: e.to_string(),
                }
            }
        })?;

        if written != bytes.len() {
            return Err(Error::PartialWrite {
                address,
                expected: bytes.len(),
                written,
            });
        }

        Ok(())
    }
}

impl Drop for ToolhelpProcess {
    fn drop(&mut self) {
        let _ = unsafe { CloseHandle(self.handle) };
    }
}

/// ToolHelp snapshot handle, closed on drop so early-return paths cannot
/// leak it.
struct Snapshot(HANDLE);

impl Snapshot {
    fn new(what: &'static str, flags: CREATE_TOOLHELP_SNAPSHOT_FLAGS, pid: u32) -> Result<Self> {
        let handle = unsafe { CreateToolhelp32Snapshot(flags, pid) }.map_err(|e| {
            Error::EnumerationFailed {
                what,
                message: e.to_string(),
            }
        })?;
        Ok(Self(handle))
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        let _ = unsafe { CloseHandle(self.0) };
    }
}

fn wide_str(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

fn is_access_denied(e: &windows::core::Error) -> bool {
    e.code() == ERROR_ACCESS_DENIED.to_hresult()
}
