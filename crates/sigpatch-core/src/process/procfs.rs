//! Linux backend: procfs enumeration, ptrace attachment, writes through
//! `/proc/<pid>/mem`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, warn};

use super::{ModuleInfo, ProcessProvider, TargetProcess};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct ProcfsProvider;

impl ProcfsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProvider for ProcfsProvider {
    type Process = ProcfsProcess;

    fn attach(&self, executable: &str) -> Result<ProcfsProcess> {
        let entries = fs::read_dir("/proc").map_err(|e| Error::EnumerationFailed {
            what: "processes",
            message: e.to_string(),
        })?;

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(pid) = name.to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            if process_name(pid).as_deref() == Some(executable) {
                debug!("matched {} (pid {})", executable, pid);
                return ProcfsProcess::attach(pid);
            }
        }

        Err(Error::ProcessNotFound(executable.to_string()))
    }
}

/// Executable file name for a pid.
///
/// Prefers the `exe` symlink, which carries the full file name. Falls back
/// to `comm` (readable without privileges, but truncated to 15 bytes by
/// the kernel) when the link cannot be resolved.
fn process_name(pid: u32) -> Option<String> {
    if let Ok(path) = fs::read_link(format!("/proc/{}/exe", pid))
        && let Some(name) = path.file_name().and_then(|n| n.to_str())
    {
        return Some(name.to_string());
    }

    let comm = fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    Some(comm.trim_end().to_string())
}

/// A ptrace-attached process plus its open `/proc/<pid>/mem`. The tracer
/// relationship is detached on drop, which also resumes the tracee.
pub struct ProcfsProcess {
    pid: Pid,
    mem: File,
}

impl ProcfsProcess {
    fn attach(pid: u32) -> Result<Self> {
        let pid = Pid::from_raw(pid as i32);

        // Writing /proc/<pid>/mem requires being the process's tracer;
        // attach stops the target until we detach.
        ptrace::attach(pid).map_err(|e| match e {
            Errno::EPERM | Errno::EACCES => Error::AccessDenied(format!(
                "ptrace attach to pid {} (needs CAP_SYS_PTRACE or same uid)",
                pid
            )),
            Errno::ESRCH => Error::ProcessNotFound(format!("pid {}", pid)),
            other => Error::ProcessOpenFailed(format!("ptrace attach to pid {}: {}", pid, other)),
        })?;

        match waitpid(pid, Some(WaitPidFlag::WSTOPPED)) {
            Ok(WaitStatus::Stopped(_, Signal::SIGSTOP)) => {}
            Ok(status) => warn!("unexpected wait status after attach: {:?}", status),
            Err(e) => {
                let _ = ptrace::detach(pid, None);
                return Err(Error::ProcessOpenFailed(format!(
                    "wait after attach to pid {}: {}",
                    pid, e
                )));
            }
        }

        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .open(format!("/proc/{}/mem", pid))
            .map_err(|e| {
                let _ = ptrace::detach(pid, None);
                if e.kind() == io::ErrorKind::PermissionDenied {
                    Error::AccessDenied(format!("open /proc/{}/mem: {}", pid, e))
                } else {
                    Error::ProcessOpenFailed(format!("open /proc/{}/mem: {}", pid, e))
                }
            })?;

        Ok(Self { pid, mem })
    }
}

impl TargetProcess for ProcfsProcess {
    fn pid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    fn find_module(&self, name: &str) -> Result<ModuleInfo> {
        let maps_path = format!("/proc/{}/maps", self.pid);
        let maps = fs::read_to_string(&maps_path).map_err(|e| Error::EnumerationFailed {
            what: "modules",
            message: format!("{}: {}", maps_path, e),
        })?;

        find_module_in_maps(&maps, name).ok_or_else(|| Error::ModuleNotFound {
            pid: self.pid(),
            name: name.to_string(),
        })
    }

    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        // write_all_at turns a short pwrite into an error, so a partial
        // write cannot be reported as success.
        self.mem.write_all_at(bytes, address).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                Error::AccessDenied(format!("write at {:#x}: {}", address, e))
            } else {
                Error::MemoryWriteFailed {
                    address,
                    message: e.to_string(),
                }
            }
        })
    }
}

impl Drop for ProcfsProcess {
    fn drop(&mut self) {
        if let Err(e) = ptrace::detach(self.pid, None) {
            debug!("ptrace detach from pid {} failed: {}", self.pid, e);
        }
    }
}

/// Find a module in the text of `/proc/<pid>/maps`.
///
/// Line format: `start-end perms offset dev inode pathname`. Mappings are
/// sorted by address and a module's image spans several of them, so the
/// first line whose backing file name matches is the load base.
fn find_module_in_maps(maps: &str, name: &str) -> Option<ModuleInfo> {
    for line in maps.lines() {
        let mut fields = line.split_whitespace();
        let Some(range) = fields.next() else { continue };
        let Some(path) = fields.nth(4) else { continue };
        if !path.starts_with('/') {
            continue;
        }

        let file_name = Path::new(path).file_name().and_then(|n| n.to_str());
        if file_name != Some(name) {
            continue;
        }

        let Some(start) = range.split('-').next() else {
            continue;
        };
        let Ok(base) = u64::from_str_radix(start, 16) else {
            continue;
        };

        return Some(ModuleInfo {
            base_address: base,
            path: PathBuf::from(path),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
555555554000-555555558000 r--p 00000000 08:01 1573684 /usr/bin/game
555555558000-55555556c000 r-xp 00004000 08:01 1573684 /usr/bin/game
7ffff7a00000-7ffff7a28000 r--p 00000000 08:01 920018 /usr/lib/client.so
7ffff7a28000-7ffff7bb0000 r-xp 00028000 08:01 920018 /usr/lib/client.so
7ffff7bb0000-7ffff7bfe000 r--p 001b0000 08:01 920018 /usr/lib/client.so
7ffff7ff3000-7ffff7ff5000 rw-p 00000000 00:00 0 [stack]
7ffff7ff5000-7ffff7ff7000 r-xp 00000000 00:00 0 [vdso]";

    #[test]
    fn test_find_module_returns_lowest_mapping() {
        let info = find_module_in_maps(MAPS, "client.so").unwrap();
        assert_eq!(info.base_address, 0x7ffff7a00000);
        assert_eq!(info.path, PathBuf::from("/usr/lib/client.so"));
    }

    #[test]
    fn test_find_module_matches_file_name_not_path() {
        let info = find_module_in_maps(MAPS, "game").unwrap();
        assert_eq!(info.base_address, 0x555555554000);
    }

    #[test]
    fn test_find_module_ignores_pseudo_mappings() {
        assert!(find_module_in_maps(MAPS, "[stack]").is_none());
        assert!(find_module_in_maps(MAPS, "missing.so").is_none());
    }

    #[test]
    fn test_find_module_exact_name_only() {
        assert!(find_module_in_maps(MAPS, "client").is_none());
        assert!(find_module_in_maps(MAPS, "CLIENT.SO").is_none());
    }
}
