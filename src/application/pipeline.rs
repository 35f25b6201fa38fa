//! Pairs Pipeline
//!
//! Coordinates the statistical stages with market data and artifact storage:
//! fetch closes -> align -> cointegration screen -> hedge ratios & spreads ->
//! stationarity filter -> z-scores.
//!
//! Cointegration and stationarity p-values are memoized per calendar date
//! through the artifact store. A failed read falls back to recomputation; a
//! failed write aborts the run.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::report::PipelineReport;
use crate::domain::{AlignError, PairValues, PriceTable};
use crate::ports::artifact_store::{ArtifactKey, ArtifactKind, ArtifactStore, PersistError};
use crate::ports::market_data::{MarketDataError, MarketDataPort, PriceQuery, Timeframe};
use crate::strategy::{
    prune, CointegrationScreener, ParamsError, PipelineConfig, SpreadEstimator, StationarityFilter,
    ZScoreEngine,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No common timestamps across symbols [{symbols}]")]
    DataGap { symbols: String },

    #[error("Price alignment failed: {0}")]
    Align(#[from] AlignError),

    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistError),

    #[error("Invalid pipeline parameters: {0}")]
    Params(#[from] ParamsError),
}

/// Whether stored artifacts for the run date may replace computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Load today's artifacts when present
    Reuse,
    /// Recompute everything, overwriting today's artifacts
    Refresh,
}

/// Batch pairs pipeline over injected market data and storage
pub struct PairsPipeline<M, S> {
    config: PipelineConfig,
    universe: Vec<String>,
    timeframe: Timeframe,
    lookback: Duration,
    market_data: M,
    store: S,
}

impl<M: MarketDataPort, S: ArtifactStore> PairsPipeline<M, S> {
    /// Create a pipeline for `universe` with hourly bars over 180 days
    pub fn new(config: PipelineConfig, universe: Vec<String>, market_data: M, store: S) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            universe,
            timeframe: Timeframe::H1,
            lookback: Duration::days(180),
            market_data,
            store,
        })
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the lookback window ending at `now` and analyze it under `now`'s date
    pub async fn run(&self, now: DateTime<Utc>, cache: CacheMode) -> Result<PipelineReport, PipelineError> {
        let query = PriceQuery::lookback(self.timeframe, now, self.lookback, self.universe.clone());
        info!(
            "Fetching {} closes for {} symbols ({} to {})",
            query.timeframe,
            query.symbols.len(),
            query.start,
            query.end
        );

        let series = self.market_data.fetch_closes(&query).await?;
        let prices = PriceTable::align(&series, &self.universe)?;

        self.analyze(&prices, now.date_naive(), cache)
    }

    /// Run every statistical stage on an aligned table
    pub fn analyze(&self, prices: &PriceTable, date: NaiveDate, cache: CacheMode) -> Result<PipelineReport, PipelineError> {
        if prices.is_empty() {
            return Err(PipelineError::DataGap {
                symbols: prices.symbols().join(", "),
            });
        }
        info!("Analyzing {} aligned rows for {}", prices.len(), date);

        let mut failures = Vec::new();
        let mut cached = Vec::new();

        // 1. Cointegration screen
        let coint_key = ArtifactKey::new(date, ArtifactKind::CointegrationPValues);
        let cointegration = match self.load_cached(&coint_key, cache) {
            Some(mut values) => {
                values.retain(|pair, _| {
                    prices.column(pair.first()).is_some() && prices.column(pair.second()).is_some()
                });
                cached.push(ArtifactKind::CointegrationPValues);
                values
            }
            None => {
                let outcome = CointegrationScreener::new(&self.config).screen(prices);
                failures.extend(outcome.failures);
                self.store.put(&coint_key, &outcome.significant)?;
                outcome.significant
            }
        };

        // 2. Hedge ratios and spreads
        let estimate = SpreadEstimator::new().estimate(prices, &cointegration);
        failures.extend(estimate.failures);
        let mut hedge_ratios = estimate.hedge_ratios;
        let mut spreads = estimate.spreads;

        // 3. Stationarity filter
        let adf_key = ArtifactKey::new(date, ArtifactKind::StationarityPValues);
        let mut stationarity = match self.load_cached(&adf_key, cache) {
            Some(mut values) => {
                values.retain(|pair, _| spreads.contains(pair));
                cached.push(ArtifactKind::StationarityPValues);
                values
            }
            None => {
                let outcome = StationarityFilter::new(&self.config).test(&spreads);
                failures.extend(outcome.failures);
                self.store.put(&adf_key, &outcome.stationary)?;
                outcome.stationary
            }
        };

        prune(&mut hedge_ratios, &mut spreads, &stationarity);
        stationarity.retain(|pair, _| hedge_ratios.contains_key(pair));
        self.store
            .put(&ArtifactKey::new(date, ArtifactKind::HedgeRatios), &hedge_ratios)?;

        // 4. Z-scores
        let engine = ZScoreEngine::new(self.config.zscore_window);
        let mut zscores = BTreeMap::new();
        for (pair, spread) in spreads.iter() {
            let series = engine.compute(spreads.index(), spread);
            self.store.put_zscores(pair, &series)?;
            zscores.insert(pair.clone(), series);
        }

        info!(
            "Run {}: {} cointegrated, {} stationary, {} omitted",
            date,
            cointegration.len(),
            hedge_ratios.len(),
            failures.len()
        );

        Ok(PipelineReport {
            date,
            rows: prices.len(),
            cointegration,
            hedge_ratios,
            stationarity,
            spreads,
            zscores,
            failures,
            cached,
            entry_band: self.config.entry_band,
        })
    }

    /// Stored values for `key`, unless caching is off or the read fails
    fn load_cached(&self, key: &ArtifactKey, cache: CacheMode) -> Option<PairValues> {
        if cache == CacheMode::Refresh {
            return None;
        }
        match self.store.get(key) {
            Ok(Some(values)) => {
                info!("Using stored {} ({} pairs)", key, values.len());
                Some(values)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read {}, recomputing: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryArtifactStore;
    use crate::domain::SymbolPair;
    use crate::ports::mocks::MockMarketData;
    use chrono::TimeZone;

    fn pipeline() -> PairsPipeline<MockMarketData, MemoryArtifactStore> {
        PairsPipeline::new(
            PipelineConfig::default(),
            vec!["A".into(), "B".into()],
            MockMarketData::new(),
            MemoryArtifactStore::new(),
        )
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PairsPipeline::new(
            PipelineConfig::default().with_window(0),
            vec!["A".into(), "B".into()],
            MockMarketData::new(),
            MemoryArtifactStore::new(),
        );
        assert!(matches!(result, Err(PipelineError::Params(_))));
    }

    #[test]
    fn test_empty_table_is_a_data_gap() {
        let prices =
            PriceTable::from_columns(Vec::new(), vec!["A".into(), "B".into()], vec![Vec::new(), Vec::new()]).unwrap();

        let err = pipeline().analyze(&prices, date(), CacheMode::Reuse).unwrap_err();
        assert!(matches!(err, PipelineError::DataGap { .. }));
        assert!(err.to_string().contains("A, B"));
    }

    #[test]
    fn test_cached_pairs_outside_universe_are_ignored() {
        let pipeline = pipeline();
        let mut stale = PairValues::new();
        stale.insert("X_Y".parse::<SymbolPair>().unwrap(), 0.01);
        pipeline
            .store()
            .put(&ArtifactKey::new(date(), ArtifactKind::CointegrationPValues), &stale)
            .unwrap();

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let index = (0..30).map(|i| start + Duration::hours(i)).collect();
        let a = (0..30).map(|i| 100.0 + (i as f64 * 0.5).sin()).collect();
        let b = (0..30).map(|i| 50.0 + (i as f64 * 0.3).cos()).collect();
        let prices = PriceTable::from_columns(index, vec!["A".into(), "B".into()], vec![a, b]).unwrap();

        let report = pipeline.analyze(&prices, date(), CacheMode::Reuse).unwrap();
        assert!(report.cointegration.is_empty());
        assert!(report.was_cached(ArtifactKind::CointegrationPValues));
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_market_data_aborts() {
        let pipeline = PairsPipeline::new(
            PipelineConfig::default(),
            vec!["A".into(), "B".into()],
            MockMarketData::new().unreachable(),
            MemoryArtifactStore::new(),
        )
        .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let err = pipeline.run(now, CacheMode::Reuse).await.unwrap_err();
        assert!(matches!(err, PipelineError::MarketData(_)));
    }
}
