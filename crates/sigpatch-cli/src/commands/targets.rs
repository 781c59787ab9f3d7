//! Targets command: list the available patch targets.

use anyhow::Result;
use sigpatch_core::TargetSet;

pub fn run(set: &TargetSet) -> Result<()> {
    println!("Available targets (version {}):", set.version);
    println!();

    for target in &set.targets {
        println!("{}", target.name);
        println!("    Process:        {}", target.process);
        println!("    Module:         {}", target.module);
        println!("    Pattern:        {}", target.pattern);
        println!("    Patch:          {}", target.patch);
        println!("    Map correction: {:#x}", target.map_correction);
    }

    Ok(())
}
