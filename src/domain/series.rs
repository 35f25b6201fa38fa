//! Spread and Z-Score Series
//!
//! Derived series that stay row-aligned with the price table they came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::pair::SymbolPair;

/// Per-pair scalar results (p-values, hedge ratios), keyed "A_B" when persisted
pub type PairValues = BTreeMap<SymbolPair, f64>;

/// Spread series for every surviving pair, one column per pair
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpreadTable {
    index: Vec<DateTime<Utc>>,
    spreads: BTreeMap<SymbolPair, Vec<f64>>,
}

impl SpreadTable {
    /// Create an empty table over the given time index
    pub fn new(index: Vec<DateTime<Utc>>) -> Self {
        Self {
            index,
            spreads: BTreeMap::new(),
        }
    }

    /// Add (or replace) a spread column. The column must match the index length.
    pub fn insert(&mut self, pair: SymbolPair, spread: Vec<f64>) {
        debug_assert_eq!(spread.len(), self.index.len(), "spread column for {} is misaligned", pair);
        self.spreads.insert(pair, spread);
    }

    pub fn get(&self, pair: &SymbolPair) -> Option<&[f64]> {
        self.spreads.get(pair).map(Vec::as_slice)
    }

    pub fn contains(&self, pair: &SymbolPair) -> bool {
        self.spreads.contains_key(pair)
    }

    /// Pairs with a spread column, in key order
    pub fn pairs(&self) -> impl Iterator<Item = &SymbolPair> {
        self.spreads.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolPair, &[f64])> {
        self.spreads.iter().map(|(pair, spread)| (pair, spread.as_slice()))
    }

    /// Number of spread columns
    pub fn len(&self) -> usize {
        self.spreads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spreads.is_empty()
    }

    /// Number of rows shared by every column
    pub fn rows(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Drop every column whose pair is not a key of `keep`
    pub fn retain_pairs(&mut self, keep: &PairValues) {
        self.spreads.retain(|pair, _| keep.contains_key(pair));
    }
}

/// One z-score observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZScore {
    /// Fewer than `window` observations so far
    Insufficient,
    /// Window standard deviation is zero; no signal
    Flat,
    /// Standardized deviation from the rolling mean
    Value(f64),
}

impl ZScore {
    /// The z-score if one is defined at this row
    pub fn value(&self) -> Option<f64> {
        match self {
            ZScore::Value(z) => Some(*z),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, ZScore::Value(_))
    }
}

/// Position of a z-score relative to a symmetric entry band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalBand {
    /// Spread rich relative to its recent mean (z > band)
    Above,
    /// Spread cheap relative to its recent mean (z < -band)
    Below,
    Inside,
}

impl SignalBand {
    pub fn classify(z_score: f64, band: f64) -> Self {
        if z_score > band {
            SignalBand::Above
        } else if z_score < -band {
            SignalBand::Below
        } else {
            SignalBand::Inside
        }
    }
}

/// Rolling z-scores for one pair, same index and length as its spread
#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreSeries {
    index: Vec<DateTime<Utc>>,
    values: Vec<ZScore>,
    window: usize,
}

impl ZScoreSeries {
    pub fn new(index: Vec<DateTime<Utc>>, values: Vec<ZScore>, window: usize) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            index,
            values,
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[ZScore] {
        &self.values
    }

    /// Rows as (timestamp, z-score) pairs
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&DateTime<Utc>, &ZScore)> {
        self.index.iter().zip(self.values.iter())
    }

    /// Most recent defined z-score
    pub fn latest(&self) -> Option<(DateTime<Utc>, f64)> {
        self.iter()
            .rev()
            .find_map(|(ts, z)| z.value().map(|v| (*ts, v)))
    }

    /// Number of rows that carry a real z-score
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|z| z.is_defined()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn index(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn pair(key: &str) -> SymbolPair {
        key.parse().unwrap()
    }

    #[test]
    fn test_retain_pairs() {
        let mut table = SpreadTable::new(index(3));
        table.insert(pair("A_B"), vec![0.1, 0.2, 0.3]);
        table.insert(pair("B_C"), vec![0.0, 0.0, 0.1]);

        let mut keep = PairValues::new();
        keep.insert(pair("B_C"), 0.01);
        table.retain_pairs(&keep);

        assert_eq!(table.len(), 1);
        assert!(table.contains(&pair("B_C")));
        assert!(!table.contains(&pair("A_B")));
        assert_eq!(table.rows(), 3);
    }

    #[test]
    fn test_zscore_value() {
        assert_eq!(ZScore::Value(1.5).value(), Some(1.5));
        assert_eq!(ZScore::Flat.value(), None);
        assert_eq!(ZScore::Insufficient.value(), None);
        assert!(!ZScore::Flat.is_defined());
    }

    #[test]
    fn test_signal_band() {
        assert_eq!(SignalBand::classify(2.5, 2.0), SignalBand::Above);
        assert_eq!(SignalBand::classify(-2.1, 2.0), SignalBand::Below);
        assert_eq!(SignalBand::classify(2.0, 2.0), SignalBand::Inside);
        assert_eq!(SignalBand::classify(0.0, 2.0), SignalBand::Inside);
    }

    #[test]
    fn test_latest_skips_undefined() {
        let idx = index(4);
        let series = ZScoreSeries::new(
            idx.clone(),
            vec![ZScore::Insufficient, ZScore::Value(0.7), ZScore::Value(-1.2), ZScore::Flat],
            2,
        );

        assert_eq!(series.latest(), Some((idx[2], -1.2)));
        assert_eq!(series.defined_count(), 2);
        assert_eq!(series.len(), 4);
    }
}
