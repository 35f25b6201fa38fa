//! Hedge Ratio & Spread Estimation
//!
//! For pair A_B with x = ln(A) and y = ln(B), the hedge ratio is the
//! no-intercept OLS slope n = sum(x*y) / sum(y*y) and the spread is
//! x - n*y, row-aligned with the price table.

use tracing::{debug, info, warn};

use crate::domain::{PairValues, PriceTable, SpreadTable, SymbolPair};
use crate::strategy::error::{PairFailure, Stage, StatError};
use crate::strategy::ols;

/// Hedge ratio and spread for a single pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairSpread {
    pub hedge_ratio: f64,
    pub spread: Vec<f64>,
}

/// Estimation output for every requested pair
#[derive(Debug, Clone, Default)]
pub struct SpreadOutcome {
    pub hedge_ratios: PairValues,
    /// Same key set as `hedge_ratios`
    pub spreads: SpreadTable,
    pub failures: Vec<PairFailure>,
}

/// Log-price hedge ratio and spread estimator
#[derive(Debug, Clone, Default)]
pub struct SpreadEstimator;

impl SpreadEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate every pair in `pairs` (the values are ignored)
    pub fn estimate(&self, prices: &PriceTable, pairs: &PairValues) -> SpreadOutcome {
        let mut outcome = SpreadOutcome {
            spreads: SpreadTable::new(prices.index().to_vec()),
            ..Default::default()
        };

        for pair in pairs.keys() {
            match self.estimate_pair(prices, pair) {
                Ok(estimate) => {
                    debug!("{}: hedge ratio {:.6}", pair, estimate.hedge_ratio);
                    outcome.hedge_ratios.insert(pair.clone(), estimate.hedge_ratio);
                    outcome.spreads.insert(pair.clone(), estimate.spread);
                }
                Err(e) => {
                    warn!("{}: hedge ratio estimation failed: {}", pair, e);
                    outcome
                        .failures
                        .push(PairFailure::new(pair.clone(), Stage::HedgeRatio, e));
                }
            }
        }

        info!(
            "Estimated hedge ratios for {}/{} pairs",
            outcome.hedge_ratios.len(),
            pairs.len()
        );
        outcome
    }

    /// Hedge ratio and spread for one pair of the table
    pub fn estimate_pair(&self, prices: &PriceTable, pair: &SymbolPair) -> Result<PairSpread, StatError> {
        let x = log_prices(prices, pair.first())?;
        let y = log_prices(prices, pair.second())?;

        let hedge_ratio = ols::slope_through_origin(&x, &y)?;
        let spread = spread(&x, &y, hedge_ratio);

        Ok(PairSpread { hedge_ratio, spread })
    }
}

/// x[t] - n * y[t]
pub fn spread(x: &[f64], y: &[f64], hedge_ratio: f64) -> Vec<f64> {
    x.iter().zip(y.iter()).map(|(a, b)| a - hedge_ratio * b).collect()
}

/// Natural log of a symbol's closes. Any price <= 0 is rejected with its row.
fn log_prices(prices: &PriceTable, symbol: &str) -> Result<Vec<f64>, StatError> {
    let column = prices.column(symbol).ok_or(StatError::InsufficientData {
        required: 1,
        actual: 0,
    })?;

    column
        .iter()
        .enumerate()
        .map(|(row, &price)| {
            if price > 0.0 {
                Ok(price.ln())
            } else {
                Err(StatError::NonPositivePrice {
                    symbol: symbol.to_string(),
                    row,
                    price,
                })
            }
        })
        .collect()
}
