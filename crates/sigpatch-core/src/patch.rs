//! The scan-and-patch engine.
//!
//! Strictly sequential: attach to the process, resolve the module, load
//! its on-disk image, scan for the signature, translate the file offset
//! to a virtual address, write. Any failure aborts the whole run; the
//! process attachment and the loaded image are dropped on every exit path.
//! Nothing here retries and nothing here terminates the program.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::image::ModuleImage;
use crate::process::{ModuleInfo, ProcessProvider, TargetProcess};
use crate::target::PatchTarget;

/// Translate a file offset inside a module image to a virtual address in
/// the process that mapped the module.
///
/// `correction` is the loader's fixed skew between the on-disk layout and
/// the mapped layout (image headers and section-alignment padding). It
/// belongs to the target, not to the memory writer.
pub fn resolve_address(base: u64, file_offset: usize, correction: i64) -> u64 {
    base.wrapping_add(file_offset as u64)
        .wrapping_add_signed(correction)
}

/// A fully resolved patch: everything needed for the write, computed up
/// front so a dry run can stop exactly one step short of applying it.
#[derive(Debug, Clone)]
pub struct PatchPlan {
    pub pid: u32,
    pub module: ModuleInfo,
    pub file_offset: usize,
    pub address: u64,
    pub patch: Vec<u8>,
}

/// Outcome of a completed run, in the shape the CLI reports it.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub pid: u32,
    pub module_base: u64,
    pub module_path: PathBuf,
    pub file_offset: usize,
    pub address: u64,
    pub bytes_written: usize,
    pub dry_run: bool,
}

/// Resolve the module, scan its on-disk image and compute the write
/// address for `target` inside an attached process.
pub fn plan_patch<P: TargetProcess>(process: &P, target: &PatchTarget) -> Result<PatchPlan> {
    let pattern = target.pattern_bytes()?;
    let patch = target.patch_bytes()?;

    let module = process.find_module(&target.module)?;
    info!(
        "module {} at {:#x} ({})",
        target.module,
        module.base_address,
        module.path.display()
    );

    let image = ModuleImage::load(&module.path)?;
    debug!(
        "loaded {} bytes from {}",
        image.len(),
        image.path().display()
    );

    let file_offset = pattern
        .find_in(image.bytes())
        .ok_or_else(|| Error::PatternNotFound {
            module: target.module.clone(),
        })?;

    let address = resolve_address(module.base_address, file_offset, target.map_correction);
    debug!(
        "pattern at file offset {:#x}, virtual address {:#x}",
        file_offset, address
    );

    Ok(PatchPlan {
        pid: process.pid(),
        module,
        file_offset,
        address,
        patch,
    })
}

/// Perform the single write a plan describes.
pub fn apply_patch<P: TargetProcess>(process: &mut P, plan: &PatchPlan) -> Result<usize> {
    process.write_bytes(plan.address, &plan.patch)?;
    info!("wrote {} bytes at {:#x}", plan.patch.len(), plan.address);
    Ok(plan.patch.len())
}

/// Run the whole sequence against a freshly attached process. With
/// `dry_run` the write is skipped and the report carries zero bytes
/// written.
pub fn execute<P: ProcessProvider>(
    provider: &P,
    target: &PatchTarget,
    dry_run: bool,
) -> Result<PatchReport> {
    info!("looking for process {}", target.process);
    let mut process = provider.attach(&target.process)?;
    info!("attached to {} (pid {})", target.process, process.pid());

    let plan = plan_patch(&process, target)?;
    let bytes_written = if dry_run {
        0
    } else {
        apply_patch(&mut process, &plan)?
    };

    Ok(PatchReport {
        pid: plan.pid,
        module_base: plan.module.base_address,
        module_path: plan.module.path,
        file_offset: plan.file_offset,
        address: plan.address,
        bytes_written,
        dry_run,
    })
}
