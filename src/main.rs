//! ampring CLI - amplifier feedback ring search
//!
//! 1. Load ampring.toml (or --config) and merge command-line overrides
//! 2. Try every ordering of the phase set on a fresh ring of amplifiers
//! 3. Print the winning ordering and its signal
//!
//! A missing or unrunnable amplifier executable aborts with a non-zero exit
//! status; every other amplifier failure only ends the trial it happened in.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ampring::config::{Config, Overrides};
use ampring::logging::{init_subscriber, Verbosity};
use ampring::report::{render_json, render_text};
use ampring::search::{search_with, Mode};
use ampring::signal::format_ordering;

/// Find the phase ordering that maximizes an amplifier ring's output
///
/// Each trial starts one amplifier per phase setting, wires them into a
/// feedback ring and relays the signal until an amplifier exits.
///
/// Examples:
///   ampring ./intcode day7.txt                 # feedback ring, phases 5-9
///   ampring ./intcode day7.txt --mode serial   # single pass, phases 0-4
///   ampring --phases 5,6,7 --timeout-ms 2000   # executable from ampring.toml
#[derive(Parser, Debug)]
#[command(name = "ampring")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Amplifier executable
    #[arg(value_name = "EXECUTABLE")]
    pub executable: Option<PathBuf>,

    /// Program file passed to every amplifier
    #[arg(value_name = "PROGRAM")]
    pub program: Option<PathBuf>,

    /// How amplifiers are wired
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Phase settings to permute (comma separated, all distinct)
    ///
    /// Defaults to 5,6,7,8,9 in feedback mode and 0,1,2,3,4 in serial mode.
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub phases: Option<Vec<i64>>,

    /// Give up on an amplifier that produces no line within this many ms
    ///
    /// A timed-out amplifier ends its trial like an exited one. Without this
    /// flag a silent amplifier blocks forever.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Config file (defaults to ./ampring.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Discard amplifier stderr
    #[arg(long, overrides_with = "worker_stderr")]
    pub quiet_workers: bool,

    /// Pass amplifier stderr through, even if ampring.toml sets quiet-workers
    #[arg(long, overrides_with = "quiet_workers")]
    pub worker_stderr: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Log every trial and exchange summary
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            executable: self.executable.clone(),
            program: self.program.clone(),
            mode: self.mode,
            phases: self.phases.clone(),
            timeout_ms: self.timeout_ms,
            quiet_workers: if self.quiet_workers {
                Some(true)
            } else if self.worker_stderr {
                Some(false)
            } else {
                None
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color);

    let config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to resolve working directory")?;
            Config::load(&cwd)
        }
    }
    .merge(cli.overrides());

    if cli.verbose {
        eprintln!("🔁 ampring v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("{}", config.display_summary());
    }

    let spec = config.worker_spec()?;
    let phases = config.effective_phases();

    let outcome = search_with(&spec, &phases, config.mode, |trial| {
        info!(
            trial = trial.index,
            ordering = %format_ordering(&trial.ordering),
            signal = trial.report.signal,
            exchanges = trial.report.exchanges,
            clean = trial.report.end.is_clean(),
            "trial"
        );
    })
    .with_context(|| format!("search over {} failed", format_ordering(&phases)))?;

    if cli.json {
        println!("{}", render_json(&outcome)?);
    } else {
        let color = !cli.no_color && std::io::IsTerminal::is_terminal(&std::io::stdout());
        println!("{}", render_text(&outcome, color));
    }

    Ok(())
}
