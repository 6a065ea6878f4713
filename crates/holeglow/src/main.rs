//! Holeglow: Pi-hole status and host health on a PiGlow LED board.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag: cleared by the Ctrl+C / SIGTERM handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "holeglow",
    version,
    about = "Pi-hole and system health indicator for the PiGlow LED board"
)]
struct Args {
    /// Path to a JSON config file (default: ./config.json, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Without a subcommand, pre-check then monitor until Ctrl+C
    #[command(subcommand)]
    command: Option<cli::Command>,
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    builder.format_target(false);
    if !verbose {
        builder.format_timestamp(None);
    }
    builder.init();
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    // "termination" also routes SIGTERM here.
    if let Err(e) = ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    }) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    if let Err(e) = cli::run(args.command, args.config.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
