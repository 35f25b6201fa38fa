//! Spread Stationarity Filter
//!
//! ADF test on every spread column. Spreads that reject the unit root at the
//! configured level survive; the hedge ratios and spread table are pruned to
//! exactly that key set.

use tracing::{debug, info, warn};

use crate::domain::{PairValues, SpreadTable};
use crate::strategy::adf;
use crate::strategy::error::{PairFailure, Stage};
use crate::strategy::params::{LagSelection, PipelineConfig};

/// Stationarity test output
#[derive(Debug, Clone, Default)]
pub struct StationarityOutcome {
    /// Pair -> ADF p-value, only stationary spreads
    pub stationary: PairValues,
    pub failures: Vec<PairFailure>,
}

#[derive(Debug, Clone)]
pub struct StationarityFilter {
    threshold: f64,
    lags: LagSelection,
}

impl StationarityFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            threshold: config.adf_threshold,
            lags: config.lag_selection,
        }
    }

    /// ADF-test each spread column and keep p < threshold
    pub fn test(&self, spreads: &SpreadTable) -> StationarityOutcome {
        let mut outcome = StationarityOutcome::default();

        for (pair, spread) in spreads.iter() {
            match adf::adf_test(spread, self.lags) {
                Ok(result) => {
                    debug!(
                        "{}: ADF stat={:.4} p={:.5} lag={}",
                        pair, result.statistic, result.p_value, result.used_lag
                    );
                    if result.p_value < self.threshold {
                        outcome.stationary.insert(pair.clone(), result.p_value);
                    }
                }
                Err(e) => {
                    warn!("{}: stationarity test failed: {}", pair, e);
                    outcome
                        .failures
                        .push(PairFailure::new(pair.clone(), Stage::Stationarity, e));
                }
            }
        }

        info!(
            "Stationarity filter: {}/{} spreads stationary at p < {}",
            outcome.stationary.len(),
            spreads.len(),
            self.threshold
        );
        outcome
    }
}

/// Restrict hedge ratios and spreads to the pairs in `retained`.
///
/// Afterwards both collections have exactly the keys they shared with
/// `retained`, so they stay in lockstep.
pub fn prune(hedge_ratios: &mut PairValues, spreads: &mut SpreadTable, retained: &PairValues) {
    hedge_ratios.retain(|pair, _| retained.contains_key(pair) && spreads.contains(pair));
    spreads.retain_pairs(hedge_ratios);
}
