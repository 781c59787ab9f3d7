//! Mock process backend for engine tests.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use super::{ModuleInfo, ProcessProvider, TargetProcess};
use crate::error::{Error, Result};

/// In-memory stand-in for a platform provider.
///
/// Writes are recorded instead of performed, and the provider counts live
/// attachments so tests can assert every exit path releases its process.
pub struct MockProvider {
    executable: String,
    pid: u32,
    modules: Vec<(String, ModuleInfo)>,
    deny_write: bool,
    writes: Rc<RefCell<Vec<(u64, Vec<u8>)>>>,
    live: Rc<Cell<usize>>,
}

impl MockProvider {
    pub fn new(executable: &str, pid: u32) -> Self {
        Self {
            executable: executable.to_string(),
            pid,
            modules: Vec::new(),
            deny_write: false,
            writes: Rc::new(RefCell::new(Vec::new())),
            live: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_module(mut self, name: &str, base_address: u64, path: &Path) -> Self {
        self.modules.push((
            name.to_string(),
            ModuleInfo {
                base_address,
                path: path.to_path_buf(),
            },
        ));
        self
    }

    pub fn deny_writes(mut self) -> Self {
        self.deny_write = true;
        self
    }

    /// All writes performed through attached processes, in order.
    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    /// Attachments created but not yet dropped.
    pub fn live_attachments(&self) -> usize {
        self.live.get()
    }
}

impl ProcessProvider for MockProvider {
    type Process = MockProcess;

    fn attach(&self, executable: &str) -> Result<MockProcess> {
        if executable != self.executable {
            return Err(Error::ProcessNotFound(executable.to_string()));
        }

        self.live.set(self.live.get() + 1);
        Ok(MockProcess {
            pid: self.pid,
            modules: self.modules.clone(),
            deny_write: self.deny_write,
            writes: Rc::clone(&self.writes),
            live: Rc::clone(&self.live),
        })
    }
}

pub struct MockProcess {
    pid: u32,
    modules: Vec<(String, ModuleInfo)>,
    deny_write: bool,
    writes: Rc<RefCell<Vec<(u64, Vec<u8>)>>>,
    live: Rc<Cell<usize>>,
}

impl TargetProcess for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn find_module(&self, name: &str) -> Result<ModuleInfo> {
        self.modules
            .iter()
            .find(|(module, _)| module == name)
            .map(|(_, info)| info.clone())
            .ok_or_else(|| Error::ModuleNotFound {
                pid: self.pid,
                name: name.to_string(),
            })
    }

    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        if self.deny_write {
            return Err(Error::AccessDenied(format!("write at {:#x}", address)));
        }

        self.writes.borrow_mut().push((address, bytes.to_vec()));
        Ok(())
    }
}

impl Drop for MockProcess {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}
