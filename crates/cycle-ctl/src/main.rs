//! Cycle clock command-line host.
//!
//! Keeps one clock in a checkpoint file and exposes its query surface:
//! status, authorized length changes, and the explicit "start next cycle"
//! check. Time is read from the system clock in whole seconds.

mod auth;
mod lock;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cycle_clock::{Checkpoint, CycleClock, CycleTicker, SharedCycleClock};
use cycle_common::config::{whole_seconds, ClockConfig};
use cycle_common::time::{CycleIndex, SystemTimeSource, TimeSource, Timestamp};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::AllowList;
use crate::lock::StateLock;

/// Environment variable naming a config file.
const CONFIG_PATH_ENV: &str = "CYCLE_CONFIG_PATH";

/// Config file picked up from the working directory.
const LOCAL_CONFIG_PATH: &str = "config/cycle.toml";

/// Cycle clock command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cycle-ctl",
    about = "Query and manage a time-derived cycle clock",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Path to the checkpoint file (overrides config file).
    #[arg(long, short = 's', value_name = "FILE", global = true)]
    state_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Start a new clock at the current time.
    Init {
        /// Initial cycle length (defaults to the configured length).
        #[arg(long, value_parser = humantime::parse_duration)]
        length: Option<Duration>,

        /// Replace an existing checkpoint.
        #[arg(long)]
        force: bool,
    },

    /// Print the clock status as JSON.
    Status {
        /// Query time in seconds since the Unix epoch (defaults to now).
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<u64>,
    },

    /// Change the cycle length, effective from the next cycle.
    SetLength {
        /// New cycle length, e.g. "1day" or "90s".
        #[arg(value_parser = humantime::parse_duration)]
        length: Duration,

        /// Who is requesting the change.
        #[arg(long)]
        actor: String,
    },

    /// Acknowledge the next cycle; fails while the acknowledged cycle is running.
    StartNext {
        /// Last acknowledged cycle index.
        #[arg(long)]
        ack: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = load_config(&args)?;
    if let Some(state_file) = &args.state_file {
        config.state_file.clone_from(state_file);
    }

    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let mut stdout = std::io::stdout().lock();
    run(&args.command, &config, time, &mut stdout)
}

/// Initialize logging with the specified log level.
///
/// Logs go to stderr so that stdout carries only command output.
fn init_logging(level: &str) {
    let filter = format!("cycle_ctl={level},cycle_clock={level},cycle_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CYCLE_CONFIG_PATH` environment variable
/// 3. `config/cycle.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<ClockConfig> {
    let env_path = std::env::var(CONFIG_PATH_ENV).ok();
    resolve_config(
        args.config.as_deref(),
        env_path.as_deref(),
        Path::new(LOCAL_CONFIG_PATH),
    )
}

fn resolve_config(
    explicit: Option<&Path>,
    env_path: Option<&str>,
    local_path: &Path,
) -> Result<ClockConfig> {
    if let Some(config_path) = explicit {
        info!(?config_path, "Loading config from command-line argument");
        return ClockConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    if let Some(env_path) = env_path {
        let config_path = Path::new(env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from CYCLE_CONFIG_PATH");
            return ClockConfig::from_file(config_path).with_context(|| {
                format!("Failed to load config from {CONFIG_PATH_ENV}={env_path}")
            });
        }
        warn!(
            path = %env_path,
            "CYCLE_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return ClockConfig::from_file(local_path)
            .with_context(|| format!("Failed to load config from {}", local_path.display()));
    }

    info!("No config file found, using built-in defaults");
    Ok(ClockConfig::default())
}

/// Execute one command against the checkpoint named in `config`.
///
/// Commands that write the checkpoint hold its [`StateLock`] from the
/// first read to the final save.
fn run(
    command: &Command,
    config: &ClockConfig,
    time: Arc<dyn TimeSource>,
    out: &mut dyn Write,
) -> Result<()> {
    let path = config.state_file.as_path();
    match command {
        Command::Init { length, force } => {
            let _lock = lock_state(path)?;
            if path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to replace it",
                    path.display()
                );
            }
            let length = whole_seconds(length.unwrap_or(config.initial_length))?;
            let now = time.now();
            let clock = CycleClock::new(length, now)?;
            save_clock(&clock.checkpoint(), path)?;
            print_status(&clock, now, out)
        }

        Command::Status { at } => {
            let clock = load_clock(path)?;
            let now = at.map_or_else(|| time.now(), Timestamp);
            print_status(&clock, now, out)
        }

        Command::SetLength { length, actor } => {
            let length = whole_seconds(*length)?;
            let _lock = lock_state(path)?;
            let clock = SharedCycleClock::new(
                load_clock(path)?,
                Arc::clone(&time),
                Arc::new(AllowList::from_config(&config.authorization)),
            );

            let pivot = clock
                .request_length_change(actor, length)
                .context("Length change failed")?;
            save_clock(&clock.checkpoint(), path)?;
            info!(
                actor = %actor,
                cycle_length = pivot.length,
                pivot_cycle = %pivot.start_index,
                pivot_start = %pivot.start_time,
                "Cycle length updated"
            );

            let status = clock.status()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
            Ok(())
        }

        Command::StartNext { ack } => {
            let mut ticker = CycleTicker::with_acknowledged(load_clock(path)?, CycleIndex(*ack));
            let started = ticker.start_next_cycle(time.now())?;
            writeln!(out, "{started}")?;
            Ok(())
        }
    }
}

fn lock_state(path: &Path) -> Result<StateLock> {
    StateLock::acquire(path).with_context(|| format!("Failed to lock {}", path.display()))
}

fn load_clock(path: &Path) -> Result<CycleClock> {
    let checkpoint = Checkpoint::load(path)
        .with_context(|| format!("Failed to load clock from {}", path.display()))?;
    CycleClock::restore(checkpoint)
        .with_context(|| format!("Failed to restore clock from {}", path.display()))
}

fn save_clock(checkpoint: &Checkpoint, path: &Path) -> Result<()> {
    checkpoint
        .save(path)
        .with_context(|| format!("Failed to save clock to {}", path.display()))
}

fn print_status(clock: &CycleClock, now: Timestamp, out: &mut dyn Write) -> Result<()> {
    let status = clock.status(now)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
    Ok(())
}
