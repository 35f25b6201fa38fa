//! Pipeline Run Report

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::domain::{PairValues, SignalBand, SpreadTable, SymbolPair, ZScoreSeries};
use crate::ports::artifact_store::ArtifactKind;
use crate::strategy::error::PairFailure;

/// Most recent defined z-score of one pair
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSignal {
    pub pair: SymbolPair,
    pub timestamp: DateTime<Utc>,
    pub z_score: f64,
    pub band: SignalBand,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub date: NaiveDate,
    /// Aligned price rows the statistics ran on
    pub rows: usize,
    /// Significant cointegration p-values
    pub cointegration: PairValues,
    /// Hedge ratios of the stationary spreads
    pub hedge_ratios: PairValues,
    /// ADF p-values of the stationary spreads
    pub stationarity: PairValues,
    /// Spreads, same key set as `hedge_ratios`
    pub spreads: SpreadTable,
    pub zscores: BTreeMap<SymbolPair, ZScoreSeries>,
    /// Pairs dropped by a numeric failure, with the reason
    pub failures: Vec<PairFailure>,
    /// Artifacts served from the store instead of recomputed
    pub cached: Vec<ArtifactKind>,
    pub entry_band: f64,
}

impl PipelineReport {
    /// Last defined z-score per pair, classified against the entry band
    pub fn latest_signals(&self) -> Vec<LatestSignal> {
        self.zscores
            .iter()
            .filter_map(|(pair, series)| {
                series.latest().map(|(timestamp, z_score)| LatestSignal {
                    pair: pair.clone(),
                    timestamp,
                    z_score,
                    band: SignalBand::classify(z_score, self.entry_band),
                })
            })
            .collect()
    }

    /// Pairs whose latest z-score is outside the entry band
    pub fn active_signals(&self) -> Vec<LatestSignal> {
        self.latest_signals()
            .into_iter()
            .filter(|s| s.band != SignalBand::Inside)
            .collect()
    }

    pub fn was_cached(&self, kind: ArtifactKind) -> bool {
        self.cached.contains(&kind)
    }
}
