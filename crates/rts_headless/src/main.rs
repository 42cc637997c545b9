//! Headless prediction runner.
//!
//! Plays a scenario through the prediction core without a renderer and
//! prints every tick as a JSON line. Meant for CI checks and tuning.
//!
//! # Usage
//!
//! ```bash
//! # Built-in scenario
//! cargo run -p rts_headless -- run --scenario detour_demo
//!
//! # Scenario file with tuned constants and a jittery frame clock
//! cargo run -p rts_headless -- run --scenario crates/rts_headless/scenarios/skirmish.ron \
//!     --config crates/rts_headless/scenarios/tuning.ron --jitter-ms 8 --seed 3
//!
//! # Validate a config file
//! cargo run -p rts_headless -- check-config crates/rts_headless/scenarios/tuning.ron
//! ```
//!
//! Output (stdout): JSON lines, see the protocol module.
//! Logs (stderr): set `RUST_LOG` or pass `--verbose`.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rts_headless::{
    scenario::{load_config, Scenario},
    HeadlessRunner, RunConfig,
};
use rts_predict::config::SimConfig;

#[derive(Parser)]
#[command(name = "rts_headless")]
#[command(about = "Headless runner for the client prediction core")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print every tick as JSON
    Run {
        /// Built-in scenario name or path to a scenario RON file
        #[arg(short, long)]
        scenario: String,

        /// Simulation config RON file (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the scenario's tick count
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Nominal wall time per frame in milliseconds
        #[arg(long, default_value = "16.666")]
        frame_ms: f32,

        /// Maximum frame time jitter in milliseconds
        #[arg(long, default_value = "0")]
        jitter_ms: f32,

        /// Seed for the jitter sequence
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Validate a simulation config file
    CheckConfig {
        /// Config RON file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries the JSON lines
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            ticks,
            frame_ms,
            jitter_ms,
            seed,
        } => cmd_run(
            &scenario,
            config,
            RunConfig {
                ticks,
                frame_ms,
                jitter_ms,
                seed,
            },
        ),
        Commands::CheckConfig { path } => cmd_check_config(&path),
    }
}

fn cmd_run(scenario: &str, config: Option<PathBuf>, run: RunConfig) {
    let scenario = match Scenario::resolve(scenario) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, scenario, "Failed to load scenario");
            std::process::exit(1);
        }
    };

    let sim_config = match config {
        Some(path) => match load_config(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load config");
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let mut runner = match HeadlessRunner::new(scenario, sim_config, run) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "Failed to stage scenario");
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = runner.run(&mut out).and_then(|summary| {
        out.flush()?;
        Ok(summary)
    });

    match result {
        Ok(summary) => {
            tracing::debug!(
                units = summary.units.len(),
                state_hash = summary.state_hash,
                "Output flushed"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to write output");
            std::process::exit(1);
        }
    }
}

fn cmd_check_config(path: &PathBuf) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                unit_radius = config.unit_radius,
                manual_speed = config.manual_speed,
                aggro_radius = config.aggro_radius,
                "Config is valid"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Config rejected");
            std::process::exit(1);
        }
    }
}
