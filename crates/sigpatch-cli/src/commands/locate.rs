//! Locate command: resolve everything, write nothing.

use anyhow::Result;
use sigpatch_core::{NativeProvider, PatchTarget, execute};

use crate::console;

pub fn run(target: &PatchTarget) -> Result<()> {
    let provider = NativeProvider::new();
    let report = execute(&provider, target, true)?;

    console::print_report(&report);
    println!("Dry run, nothing written.");
    Ok(())
}
