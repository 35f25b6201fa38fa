//! In-memory port implementations for tests and dry runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::PriceSeries;
use crate::ports::market_data::{MarketDataError, MarketDataPort, PriceQuery};

/// Mock market data port that records queries and serves canned series
#[derive(Debug, Default, Clone)]
pub struct MockMarketData {
    queries: Arc<Mutex<Vec<PriceQuery>>>,
    series: Arc<Mutex<HashMap<String, PriceSeries>>>,
    unreachable: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve `series` for `symbol`
    pub fn with_series(self, symbol: &str, series: PriceSeries) -> Self {
        lock(&self.series).insert(symbol.to_string(), series);
        self
    }

    /// Builder method making every fetch fail
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// All queries received so far
    pub fn queries(&self) -> Vec<PriceQuery> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_closes(&self, query: &PriceQuery) -> Result<HashMap<String, PriceSeries>, MarketDataError> {
        lock(&self.queries).push(query.clone());

        if self.unreachable {
            return Err(MarketDataError::Unavailable("mock configured as unreachable".into()));
        }

        let series = lock(&self.series);
        let mut result = HashMap::new();
        for symbol in &query.symbols {
            let points = series
                .get(symbol)
                .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.clone()))?;
            let in_range = points.iter().filter(|p| query.contains(p.timestamp)).copied().collect();
            result.insert(symbol.clone(), in_range);
        }
        Ok(result)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
