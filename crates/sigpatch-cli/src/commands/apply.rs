//! Apply command: the full locate-and-patch flow.

use anyhow::Result;
use sigpatch_core::{NativeProvider, PatchTarget, execute};

use crate::console;

pub fn run(target: &PatchTarget, no_prompt: bool) -> Result<()> {
    console::print_warning(target);
    if !no_prompt && !console::confirm()? {
        println!("Nothing patched.");
        return Ok(());
    }

    let provider = NativeProvider::new();
    let report = execute(&provider, target, false)?;

    console::print_report(&report);
    println!("Applied {} byte patch", report.bytes_written);

    if !no_prompt {
        console::pause()?;
    }
    Ok(())
}
