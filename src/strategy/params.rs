//! Pipeline Parameters
//!
//! Configuration structs for the pairs pipeline. Defaults mirror the research
//! setup: 5% significance for both tests and a 20-bar z-score window.

use serde::{Deserialize, Serialize};

/// Which ordered pairs the cointegration screener enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PairSelection {
    /// Every ordered pair (A, B) with A != B
    #[default]
    Full,
    /// Second member drawn from every symbol except the last one in the universe
    Legacy,
}

/// Lag-length selection for augmented Dickey-Fuller regressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LagSelection {
    /// Minimize Akaike information criterion up to the default maximum lag
    #[default]
    Aic,
    /// Minimize Bayesian information criterion up to the default maximum lag
    Bic,
    /// Use exactly this many lagged differences
    Fixed(usize),
}

/// Main pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Trailing observations for rolling z-score statistics
    pub zscore_window: usize,
    /// Cointegration p-value must be strictly below this
    pub coint_threshold: f64,
    /// Spread ADF p-value must be strictly below this
    pub adf_threshold: f64,
    /// Pair enumeration used by the screener
    pub pair_selection: PairSelection,
    /// Lag selection for both ADF regressions
    pub lag_selection: LagSelection,
    /// |z| beyond which a spread is reported as outside its band
    pub entry_band: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zscore_window: 20,
            coint_threshold: 0.05,
            adf_threshold: 0.05,
            pair_selection: PairSelection::Full,
            lag_selection: LagSelection::Aic,
            entry_band: 2.0,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with a custom z-score window
    pub fn with_window(mut self, window: usize) -> Self {
        self.zscore_window = window;
        self
    }

    /// Create a new config with custom significance thresholds
    pub fn with_thresholds(mut self, coint: f64, adf: f64) -> Self {
        self.coint_threshold = coint;
        self.adf_threshold = adf;
        self
    }

    pub fn with_pair_selection(mut self, selection: PairSelection) -> Self {
        self.pair_selection = selection;
        self
    }

    pub fn with_lag_selection(mut self, lags: LagSelection) -> Self {
        self.lag_selection = lags;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.zscore_window < 2 {
            return Err(ParamsError::InvalidWindow(self.zscore_window));
        }
        if !(self.coint_threshold > 0.0 && self.coint_threshold < 1.0) {
            return Err(ParamsError::InvalidThreshold("coint_threshold", self.coint_threshold));
        }
        if !(self.adf_threshold > 0.0 && self.adf_threshold < 1.0) {
            return Err(ParamsError::InvalidThreshold("adf_threshold", self.adf_threshold));
        }
        if !(self.entry_band > 0.0 && self.entry_band.is_finite()) {
            return Err(ParamsError::InvalidEntryBand(self.entry_band));
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid z-score window: {0} (minimum 2)")]
    InvalidWindow(usize),
    #[error("Invalid {0}: {1} (must be 0 < p < 1)")]
    InvalidThreshold(&'static str, f64),
    #[error("Invalid entry band: {0} (must be > 0)")]
    InvalidEntryBand(f64),
}
