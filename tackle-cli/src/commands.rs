use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use tackle_config::TackleConfig;
use tackle_telemetry::metrics::MetricsRecorder;
use tracing::info;

use crate::scenario;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to `config/tackle.yaml` plus environment overrides
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a timer scenario on a frozen clock and print the firing log
    Replay(ReplayArgs),
    /// Print the clock's current instant
    Now(NowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Scenario file (YAML)
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Print Prometheus metrics after the firing log
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct NowArgs {
    /// Freeze the clock at this RFC 3339 instant first
    #[arg(long)]
    pub frozen: Option<DateTime<Utc>>,
}

pub fn run_replay(args: ReplayArgs, config: &TackleConfig) -> anyhow::Result<()> {
    let scenario = scenario::load_scenario(&args.scenario)?;
    let metrics = MetricsRecorder::new()?;
    info!(scenario = %args.scenario.display(), timers = scenario.timers.len(), "replaying scenario");

    let fired = scenario::replay(
        tackle_clock::global(),
        &scenario,
        config.clock.wait_timeout(),
        Some(&metrics),
    )?;
    for event in &fired {
        println!("{event}");
    }

    if args.metrics || config.telemetry.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

pub fn run_now(args: NowArgs) -> anyhow::Result<()> {
    let clock = tackle_clock::global();
    let _frozen = args.frozen.map(|at| clock.freeze_scoped(at));
    println!("{}", clock.now().to_rfc3339_opts(SecondsFormat::Nanos, true));
    Ok(())
}
