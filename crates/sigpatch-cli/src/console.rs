//! Terminal interaction: warning banner, key prompts, progress report.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use owo_colors::OwoColorize;
use sigpatch_core::{PatchReport, PatchTarget};

pub fn print_warning(target: &PatchTarget) {
    let rule = "=".repeat(78);
    println!("{}", rule.yellow());
    println!("{}", "!!! WARNING !!!".yellow().bold());
    println!(
        "This program is going to patch the code of the running {} process.",
        target.process
    );
    println!("Connecting to secured servers with a modified client can get your account");
    println!("banned. Use it at your own risk; nothing is written to disk, restarting the");
    println!("process restores the original code.");
    println!("{}", rule.yellow());
}

/// "Press Y to continue" gate. Any other key declines.
pub fn confirm() -> Result<bool> {
    println!("Press Y to continue or any other key to quit");
    let key = read_key()?;
    Ok(matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')))
}

pub fn pause() -> Result<()> {
    println!("Press any key to exit");
    read_key()?;
    Ok(())
}

fn read_key() -> Result<KeyCode> {
    enable_raw_mode()?;
    let result = wait_for_key();
    disable_raw_mode()?;
    result
}

fn wait_for_key() -> Result<KeyCode> {
    loop {
        // Key releases are reported too on some terminals; only presses count.
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            return Ok(key.code);
        }
    }
}

pub fn print_report(report: &PatchReport) {
    println!("Found running process:");
    println!("    PID:            {}", report.pid);
    println!("Found module:");
    println!("    Base address:   {:#x}", report.module_base);
    println!("    Path:           {}", report.module_path.display());
    println!("Found patch target:");
    println!("    File offset:    {:#x}", report.file_offset);
    println!("    Virtual addr:   {:#x}", report.address);
}
