//! ## tackle-cli
//! **Command line front end for the virtual clock**
//!
//! Replays timer scenarios on a frozen timeline and prints the clock's view
//! of "now".

use clap::Parser;
use tackle_config::TackleConfig;
use tackle_telemetry::logging::EventLogger;

mod commands;
mod scenario;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => TackleConfig::load_from_path(path)?,
        None => TackleConfig::load()?,
    };
    EventLogger::init(&config.telemetry.log_filter)?;
    tackle_clock::configure_global(config.clock.guard)?;

    match cli.command {
        Commands::Replay(args) => commands::run_replay(args, &config),
        Commands::Now(args) => commands::run_now(args),
    }
}
