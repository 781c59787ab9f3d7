//! Patch target definitions.
//!
//! A target bundles the reverse-engineered knowledge about one
//! application: which process to find, which module inside it, the byte
//! signature to locate in the module's on-disk image, the replacement
//! bytes, and the loader's file-to-memory offset correction. Targets are
//! data: a builtin set is compiled in, and sets can be loaded from and
//! saved to JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::pattern::{BytePattern, parse_patch_bytes, parse_pattern};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchTarget {
    pub name: String,
    /// Executable file name of the process to patch.
    pub process: String,
    /// File name of the module whose image carries the signature.
    pub module: String,
    /// Signature in text form, e.g. `"75 ?? 8B 0D"`.
    pub pattern: String,
    /// Replacement bytes in the same token syntax, wildcards rejected.
    pub patch: String,
    /// Applied on top of `module base + file offset` when translating the
    /// match to a virtual address. Loader/format specific; determined
    /// empirically per target.
    #[serde(default)]
    pub map_correction: i64,
}

impl PatchTarget {
    pub fn pattern_bytes(&self) -> Result<BytePattern> {
        parse_pattern(&self.pattern)
    }

    pub fn patch_bytes(&self) -> Result<Vec<u8>> {
        parse_patch_bytes(&self.patch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSet {
    pub version: String,
    pub targets: Vec<PatchTarget>,
}

impl TargetSet {
    pub fn get(&self, name: &str) -> Option<&PatchTarget> {
        self.targets
            .iter()
            .find(|target| target.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<TargetSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_targets<P: AsRef<Path>>(path: P, targets: &TargetSet) -> Result<()> {
    let content = serde_json::to_string_pretty(targets)?;
    fs::write(path, content)?;
    Ok(())
}

/// Targets compiled into the binary.
pub fn builtin_targets() -> TargetSet {
    TargetSet {
        version: "1".to_string(),
        targets: vec![hud_inspect_target()],
    }
}

// The call to the friend-or-party check guarding the HUD inspect panel:
// jnz over the call site. Patching the jnz into an unconditional jmp short
// skips the check.
#[cfg(target_os = "windows")]
fn hud_inspect_target() -> PatchTarget {
    PatchTarget {
        name: "hud-inspect".to_string(),
        process: "hl2.exe".to_string(),
        module: "client.dll".to_string(),
        pattern: "75 ?? 8B 0D ?? ?? ?? ?? 68 ?? ?? ?? ?? 8B 01 FF 50 ?? 5E 5F".to_string(),
        patch: "EB".to_string(),
        // The PE loader maps code sections 0xC00 past their raw file offset.
        map_correction: 0xC00,
    }
}

#[cfg(not(target_os = "windows"))]
fn hud_inspect_target() -> PatchTarget {
    PatchTarget {
        name: "hud-inspect".to_string(),
        process: "hl2_linux".to_string(),
        module: "client.so".to_string(),
        pattern: "75 ?? 8B 0D ?? ?? ?? ?? 68 ?? ?? ?? ?? 8B 01 FF 50 ?? 5E 5F".to_string(),
        patch: "EB".to_string(),
        map_correction: 0,
    }
}
