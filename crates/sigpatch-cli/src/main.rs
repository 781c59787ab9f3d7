use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sigpatch_core::{PatchTarget, TargetSet};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "sigpatch")]
#[command(about = "Find a byte signature in a running process's module and patch it")]
struct Args {
    /// Load patch targets from a JSON file instead of the builtin set
    #[arg(long, global = true)]
    targets_file: Option<PathBuf>,

    /// Name of the target to use (defaults to the only/first one)
    #[arg(long, global = true)]
    target: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate the signature and apply the patch
    Apply {
        /// Skip the confirmation prompt and the final key-press pause
        #[arg(long = "no-prompt", alias = "yes")]
        no_prompt: bool,
    },
    /// Resolve process, module and patch address without writing anything
    Locate,
    /// List the available patch targets
    Targets,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Single exit point: every error below propagates here, is reported
    // once, and maps to a non-zero status.
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sigpatch: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let set = match &args.targets_file {
        Some(path) => sigpatch_core::load_targets(path)?,
        None => sigpatch_core::builtin_targets(),
    };

    match args.command {
        Command::Apply { no_prompt } => {
            let target = select_target(&set, args.target.as_deref())?;
            commands::apply::run(target, no_prompt)
        }
        Command::Locate => {
            let target = select_target(&set, args.target.as_deref())?;
            commands::locate::run(target)
        }
        Command::Targets => commands::targets::run(&set),
    }
}

fn select_target<'a>(
    set: &'a TargetSet,
    name: Option<&str>,
) -> sigpatch_core::Result<&'a PatchTarget> {
    match name {
        Some(name) => set
            .get(name)
            .ok_or_else(|| sigpatch_core::Error::UnknownTarget(name.to_string())),
        None => set
            .targets
            .first()
            .ok_or_else(|| sigpatch_core::Error::UnknownTarget("target set is empty".to_string())),
    }
}
