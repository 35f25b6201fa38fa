//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the pairs-scout pipeline.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::market_data::CsvBarSource;
use crate::adapters::storage::FileArtifactStore;
use crate::application::{CacheMode, PairsPipeline, PipelineReport};
use crate::config::{load_config, Config};
use crate::domain::PairValues;
use crate::ports::artifact_store::{ArtifactKey, ArtifactKind, ArtifactStore};
use crate::strategy::PipelineConfig;

/// pairs-scout - Cointegrated pairs screening for FX and CFD symbols
#[derive(Parser, Debug)]
#[command(
    name = "pairs-scout",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Cointegrated pairs screening over exported price bars",
    long_about = "pairs-scout screens every ordered symbol pair for Engle-Granger cointegration, \
                  estimates log-price hedge ratios, keeps spreads that pass an ADF test and \
                  writes rolling z-scores for each surviving pair."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the pipeline and print the surviving pairs
    Run(RunCmd),

    /// Print the stored artifacts for a date
    Show(ShowCmd),
}

impl Command {
    fn config_path(&self) -> &PathBuf {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Show(cmd) => &cmd.config,
        }
    }
}

/// Run the pipeline
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/pairs.toml")]
    pub config: PathBuf,

    /// Run as of the end of this UTC date (default: now)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Recompute instead of reusing the date's stored artifacts
    #[arg(long)]
    pub fresh: bool,
}

/// Show stored artifacts
#[derive(Parser, Debug)]
pub struct ShowCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/pairs.toml")]
    pub config: PathBuf,

    /// Artifact date (default: today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

/// Strict `YYYY-MM-DD`; chrono alone would read "07-03-24" as year 7
fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let well_formed = value.len() == 10
        && value
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(format!("expected YYYY-MM-DD, got '{}'", value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", value, e))
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config_path = app.command.config_path().clone();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Show(cmd) => show_command(cmd, config),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn file_store(config: &Config) -> FileArtifactStore {
    FileArtifactStore::new(config.storage.get_artifact_dir(), config.storage.get_zscore_dir())
}

/// End of `date` in UTC, or now
fn as_of(date: Option<NaiveDate>) -> Result<DateTime<Utc>> {
    match date {
        Some(date) => date
            .and_hms_opt(23, 59, 59)
            .map(|naive| naive.and_utc())
            .with_context(|| format!("Invalid run date {}", date)),
        None => Ok(Utc::now()),
    }
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Starting pairs-scout run");
    tracing::info!("Config: {}", cmd.config.display());

    let now = as_of(cmd.date)?;
    let cache = if cmd.fresh { CacheMode::Refresh } else { CacheMode::Reuse };

    let source = CsvBarSource::new(config.data.get_source_dir());
    let pipeline = PairsPipeline::new(
        PipelineConfig::from(&config),
        config.universe.symbols.clone(),
        source,
        file_store(&config),
    )
    .context("Invalid pipeline configuration")?
    .with_timeframe(config.data.timeframe)
    .with_lookback(config.data.lookback());

    let report = pipeline
        .run(now, cache)
        .await
        .context("Pipeline run failed")?;

    print_report(&report);
    Ok(())
}

/// Handle show command
fn show_command(cmd: ShowCmd, config: Config) -> Result<()> {
    let date = cmd.date.unwrap_or_else(|| Utc::now().date_naive());
    let store = file_store(&config);

    println!("Artifacts for {} in {}", date, config.storage.get_artifact_dir().display());
    for kind in ArtifactKind::ALL {
        let key = ArtifactKey::new(date, kind);
        let values = store
            .get(&key)
            .with_context(|| format!("Failed to read {}", key))?;

        println!();
        match values {
            Some(values) => print_values(kind.name(), &values),
            None => println!("{}: not found", kind.name()),
        }
    }
    Ok(())
}

fn print_values(title: &str, values: &PairValues) {
    println!("{} ({} pairs)", title, values.len());
    for (pair, value) in values {
        println!("  {:<24} {:>12.6}", pair.key(), value);
    }
}

fn print_report(report: &PipelineReport) {
    println!("pairs-scout run {} ({} aligned rows)", report.date, report.rows);
    if !report.cached.is_empty() {
        let cached: Vec<&str> = report.cached.iter().map(|k| k.name()).collect();
        println!("Reused stored artifacts: {}", cached.join(", "));
    }

    println!();
    print_values("Cointegrated (Engle-Granger p)", &report.cointegration);
    println!();
    print_values("Stationary spreads (ADF p)", &report.stationarity);
    println!();
    print_values("Hedge ratios", &report.hedge_ratios);

    println!();
    println!("Latest z-scores (band ±{})", report.entry_band);
    for signal in report.latest_signals() {
        println!(
            "  {:<24} {:>8.3}  {:?}  at {}",
            signal.pair.key(),
            signal.z_score,
            signal.band,
            signal.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("Omitted pairs ({})", report.failures.len());
        for failure in &report.failures {
            println!("  {}", failure);
        }
    }
}
