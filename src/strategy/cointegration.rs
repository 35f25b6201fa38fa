//! Cointegration Screener
//!
//! Engle-Granger two-step test over ordered symbol pairs:
//! 1. Regress the first series on the second plus a constant
//! 2. ADF test (no deterministic terms) on the regression residuals
//!
//! The residual statistic is scored against the two-variable MacKinnon
//! surface. Pairs whose p-value is below the configured threshold survive.

use nalgebra::DMatrix;
use tracing::{debug, info, warn};

use crate::domain::{PairValues, PriceTable, SymbolPair};
use crate::strategy::adf::{self, Trend};
use crate::strategy::error::{PairFailure, Stage, StatError};
use crate::strategy::mackinnon::{self, CriticalValues};
use crate::strategy::ols;
use crate::strategy::params::{LagSelection, PairSelection, PipelineConfig};

/// R-squared at or above `1 - PERFECT_FIT_TOLERANCE` marks collinear series
const PERFECT_FIT_TOLERANCE: f64 = 100.0 * 1.490_116_119_384_765_6e-8;

/// Engle-Granger test output for one ordered pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngleGrangerResult {
    /// ADF t-statistic of the cointegrating residuals
    pub statistic: f64,
    pub p_value: f64,
    /// Lagged differences used in the residual ADF regression
    pub used_lag: usize,
    /// Critical values for the pair's sample size
    pub critical_values: CriticalValues,
    /// Slope of the first series on the second in the cointegrating regression
    pub slope: f64,
}

/// Test whether `y0` and `y1` are cointegrated.
pub fn engle_granger(
    y0: &[f64],
    y1: &[f64],
    lags: LagSelection,
) -> Result<EngleGrangerResult, StatError> {
    if y0.len() != y1.len() {
        return Err(StatError::LengthMismatch {
            left: y0.len(),
            right: y1.len(),
        });
    }
    let nobs = y0.len();
    if let Some(row) = y1.iter().position(|v| !v.is_finite()) {
        return Err(StatError::NonFinite(row));
    }

    let design = DMatrix::from_fn(nobs, 2, |r, c| if c == 0 { y1[r] } else { 1.0 });
    let fit = ols::fit(y0, &design, true)?;

    if fit.rsquared() >= 1.0 - PERFECT_FIT_TOLERANCE {
        return Err(StatError::PerfectFit);
    }

    let regression = adf::adf_regression(fit.residuals(), Trend::None, lags)?;
    let p_value = mackinnon::p_value(regression.statistic, 2).ok_or(StatError::UndefinedStatistic)?;
    let critical_values =
        mackinnon::critical_values(2, nobs - 1).ok_or(StatError::UndefinedStatistic)?;

    Ok(EngleGrangerResult {
        statistic: regression.statistic,
        p_value,
        used_lag: regression.used_lag,
        critical_values,
        slope: fit.params()[0],
    })
}

/// Screening output: significant pairs plus the pairs that could not be tested
#[derive(Debug, Clone, Default)]
pub struct ScreenOutcome {
    /// Pair -> p-value, only entries strictly below the threshold
    pub significant: PairValues,
    pub failures: Vec<PairFailure>,
}

/// Pairwise cointegration screen over a price table
#[derive(Debug, Clone)]
pub struct CointegrationScreener {
    threshold: f64,
    selection: PairSelection,
    lags: LagSelection,
}

impl CointegrationScreener {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            threshold: config.coint_threshold,
            selection: config.pair_selection,
            lags: config.lag_selection,
        }
    }

    /// Ordered pairs to test, self-pairs excluded.
    ///
    /// `Legacy` never uses the last symbol of the universe as second member.
    pub fn candidate_pairs(&self, symbols: &[String]) -> Vec<SymbolPair> {
        let second_members = match self.selection {
            PairSelection::Full => symbols,
            PairSelection::Legacy => &symbols[..symbols.len().saturating_sub(1)],
        };

        let mut pairs = Vec::new();
        for first in symbols {
            for second in second_members {
                if first == second {
                    continue;
                }
                match SymbolPair::new(first.as_str(), second.as_str()) {
                    Ok(pair) => pairs.push(pair),
                    Err(e) => warn!("Skipping symbols {} / {}: {}", first, second, e),
                }
            }
        }
        pairs
    }

    /// Test every candidate pair on raw closing prices
    pub fn screen(&self, prices: &PriceTable) -> ScreenOutcome {
        let mut outcome = ScreenOutcome::default();
        if prices.is_empty() {
            info!("Cointegration screen skipped: price table is empty");
            return outcome;
        }

        let candidates = self.candidate_pairs(prices.symbols());
        for pair in &candidates {
            let (Some(a), Some(b)) = (prices.column(pair.first()), prices.column(pair.second())) else {
                continue;
            };

            match engle_granger(a, b, self.lags) {
                Ok(result) => {
                    debug!(
                        "{}: EG stat={:.4} p={:.5} lag={}",
                        pair, result.statistic, result.p_value, result.used_lag
                    );
                    if result.p_value < self.threshold {
                        outcome.significant.insert(pair.clone(), result.p_value);
                    }
                }
                Err(e) => {
                    warn!("{}: cointegration test failed: {}", pair, e);
                    outcome
                        .failures
                        .push(PairFailure::new(pair.clone(), Stage::Cointegration, e));
                }
            }
        }

        info!(
            "Cointegration screen: {}/{} pairs significant at p < {}",
            outcome.significant.len(),
            candidates.len(),
            self.threshold
        );
        outcome
    }
}
