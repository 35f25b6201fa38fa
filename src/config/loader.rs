//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/pairs.toml.

use chrono::Duration;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::PAIR_SEPARATOR;
use crate::ports::market_data::Timeframe;
use crate::strategy::params::{LagSelection, PairSelection, PipelineConfig};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub universe: UniverseSection,
    pub data: DataSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Symbol universe, in screening order
#[derive(Debug, Clone, Deserialize)]
pub struct UniverseSection {
    pub symbols: Vec<String>,
}

/// Market data section
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// Bar size: M1, M5, M15, M30, H1, H4, D1
    pub timeframe: Timeframe,
    /// History to request, ending at the run time
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Directory holding `{SYMBOL}.csv` bar files
    pub source_dir: String,
}

impl DataSection {
    /// Source directory with PAIRS_DATA_DIR override and ~ expansion
    pub fn get_source_dir(&self) -> PathBuf {
        resolve_path("PAIRS_DATA_DIR", &self.source_dir)
    }

    pub fn lookback(&self) -> Duration {
        Duration::days(i64::from(self.lookback_days))
    }
}

/// Lag-length method names accepted in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LagMethod {
    #[default]
    Aic,
    Bic,
    Fixed,
}

/// Statistical pipeline section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Rolling window for z-scores (in bars)
    pub zscore_window: usize,
    /// Cointegration p-value cutoff
    pub coint_threshold: f64,
    /// Spread ADF p-value cutoff
    pub adf_threshold: f64,
    /// "full" or "legacy" pair enumeration
    pub pair_selection: PairSelection,
    /// "aic", "bic" or "fixed"
    pub lag_selection: LagMethod,
    /// Lagged differences when lag_selection = "fixed"
    pub fixed_lag: usize,
    /// |z| band reported as a signal
    pub entry_band: f64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            zscore_window: defaults.zscore_window,
            coint_threshold: defaults.coint_threshold,
            adf_threshold: defaults.adf_threshold,
            pair_selection: defaults.pair_selection,
            lag_selection: LagMethod::Aic,
            fixed_lag: 1,
            entry_band: defaults.entry_band,
        }
    }
}

/// Artifact storage section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for date-stamped JSON artifacts
    pub artifact_dir: String,
    /// Directory for per-pair z-score CSV files
    pub zscore_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            artifact_dir: "artifacts".to_string(),
            zscore_dir: "artifacts/zscores".to_string(),
        }
    }
}

impl StorageSection {
    /// Artifact directory with PAIRS_ARTIFACT_DIR override and ~ expansion
    pub fn get_artifact_dir(&self) -> PathBuf {
        resolve_path("PAIRS_ARTIFACT_DIR", &self.artifact_dir)
    }

    /// Z-score directory with PAIRS_ZSCORE_DIR override. A `zscore_dir` inside
    /// `artifact_dir` moves along with a PAIRS_ARTIFACT_DIR override.
    pub fn get_zscore_dir(&self) -> PathBuf {
        match std::env::var("PAIRS_ZSCORE_DIR") {
            Ok(value) if !value.is_empty() => expand_path(&value),
            _ => rebase_under(&self.get_artifact_dir(), &self.artifact_dir, &self.zscore_dir),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_lookback_days() -> u32 {
    180
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate universe
        let symbols = &self.universe.symbols;
        if symbols.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "universe needs at least 2 symbols, got {}",
                symbols.len()
            )));
        }

        let mut seen = HashSet::new();
        for symbol in symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "symbol names cannot be empty".to_string(),
                ));
            }
            if symbol.contains(PAIR_SEPARATOR) {
                return Err(ConfigError::ValidationError(format!(
                    "symbol {} contains the pair separator '{}'",
                    symbol, PAIR_SEPARATOR
                )));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "symbol {} is listed more than once",
                    symbol
                )));
            }
        }

        // Validate data
        if self.data.lookback_days == 0 {
            return Err(ConfigError::ValidationError(
                "lookback_days must be > 0".to_string(),
            ));
        }

        if self.data.source_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "source_dir cannot be empty".to_string(),
            ));
        }

        // Validate pipeline
        PipelineConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        // Validate storage
        if self.storage.artifact_dir.is_empty() || self.storage.zscore_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "artifact_dir and zscore_dir cannot be empty".to_string(),
            ));
        }

        // Validate logging
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to PipelineConfig
impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        let pipeline = &config.pipeline;
        let lag_selection = match pipeline.lag_selection {
            LagMethod::Aic => LagSelection::Aic,
            LagMethod::Bic => LagSelection::Bic,
            LagMethod::Fixed => LagSelection::Fixed(pipeline.fixed_lag),
        };

        PipelineConfig {
            zscore_window: pipeline.zscore_window,
            coint_threshold: pipeline.coint_threshold,
            adf_threshold: pipeline.adf_threshold,
            pair_selection: pipeline.pair_selection,
            lag_selection,
            entry_band: pipeline.entry_band,
        }
    }
}

/// Environment override first, then the configured value, ~ expanded
fn resolve_path(env_key: &str, configured: &str) -> PathBuf {
    match std::env::var(env_key) {
        Ok(value) if !value.is_empty() => expand_path(&value),
        _ => expand_path(configured),
    }
}

/// Re-root `nested` from `configured_root` onto `resolved_root`; paths outside
/// the configured root are returned unchanged
fn rebase_under(resolved_root: &Path, configured_root: &str, nested: &str) -> PathBuf {
    let nested = expand_path(nested);
    match nested.strip_prefix(expand_path(configured_root)) {
        Ok(rest) => resolved_root.join(rest),
        Err(_) => nested,
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
