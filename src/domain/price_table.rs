//! Price Table
//!
//! Time-aligned closing prices for the whole symbol universe. Built by
//! intersecting the timestamps of every per-symbol series, so every row is
//! fully populated and the index is strictly increasing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("symbol universe is empty")]
    EmptyUniverse,

    #[error("no price series supplied for symbol {0}")]
    MissingSymbol(String),

    #[error("symbol {0} appears more than once in the universe")]
    DuplicateSymbol(String),

    #[error("column {symbol} has {actual} rows, index has {expected}")]
    LengthMismatch {
        symbol: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} columns, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("index is not strictly increasing at row {0}")]
    UnorderedIndex(usize),

    #[error("column {symbol} has a missing value at row {row}")]
    MissingValue { symbol: String, row: usize },
}

/// A single closing price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Time-indexed closing prices for one symbol, as delivered by market data
pub type PriceSeries = Vec<PricePoint>;

/// Aligned multi-symbol price table
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index: Vec<DateTime<Utc>>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Join per-symbol series on the timestamps every symbol has a finite price for.
    ///
    /// Within a series the last observation for a timestamp wins. An empty
    /// intersection produces an empty table, not an error.
    pub fn align(
        series: &HashMap<String, PriceSeries>,
        symbols: &[String],
    ) -> Result<Self, AlignError> {
        check_universe(symbols)?;

        let mut by_symbol: Vec<BTreeMap<DateTime<Utc>, f64>> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let points = series
                .get(symbol)
                .ok_or_else(|| AlignError::MissingSymbol(symbol.clone()))?;

            let mut observed = BTreeMap::new();
            for point in points {
                if point.close.is_finite() {
                    observed.insert(point.timestamp, point.close);
                } else {
                    observed.remove(&point.timestamp);
                }
            }
            by_symbol.push(observed);
        }

        let index: Vec<DateTime<Utc>> = by_symbol[0]
            .keys()
            .filter(|ts| by_symbol[1..].iter().all(|other| other.contains_key(*ts)))
            .copied()
            .collect();

        let columns = by_symbol
            .iter()
            .map(|observed| index.iter().map(|ts| observed[ts]).collect())
            .collect();

        tracing::debug!(
            "Aligned {} symbols on {} common timestamps",
            symbols.len(),
            index.len()
        );

        Ok(Self {
            index,
            symbols: symbols.to_vec(),
            columns,
        })
    }

    /// Build a table from already aligned columns, validating the invariants
    pub fn from_columns(
        index: Vec<DateTime<Utc>>,
        symbols: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, AlignError> {
        check_universe(&symbols)?;

        if columns.len() != symbols.len() {
            return Err(AlignError::ColumnCount {
                expected: symbols.len(),
                actual: columns.len(),
            });
        }

        if let Some(row) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(AlignError::UnorderedIndex(row + 1));
        }

        for (symbol, column) in symbols.iter().zip(columns.iter()) {
            if column.len() != index.len() {
                return Err(AlignError::LengthMismatch {
                    symbol: symbol.clone(),
                    expected: index.len(),
                    actual: column.len(),
                });
            }
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(AlignError::MissingValue {
                    symbol: symbol.clone(),
                    row,
                });
            }
        }

        Ok(Self {
            index,
            symbols,
            columns,
        })
    }

    /// Number of aligned rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Shared time index
    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Symbol universe in configured order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Closing prices for one symbol
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }
}

fn check_universe(symbols: &[String]) -> Result<(), AlignError> {
    if symbols.is_empty() {
        return Err(AlignError::EmptyUniverse);
    }
    let mut seen = HashSet::new();
    for symbol in symbols {
        if !seen.insert(symbol.as_str()) {
            return Err(AlignError::DuplicateSymbol(symbol.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn series(points: &[(i64, f64)]) -> PriceSeries {
        points.iter().map(|&(h, p)| PricePoint::new(hour(h), p)).collect()
    }

    fn universe(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_align_keeps_common_timestamps() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(0, 1.0), (1, 1.1), (2, 1.2), (3, 1.3)]));
        input.insert("B".to_string(), series(&[(1, 2.1), (2, 2.2), (3, 2.3), (4, 2.4)]));

        let table = PriceTable::align(&input, &universe(&["A", "B"])).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.index(), &[hour(1), hour(2), hour(3)]);
        assert_eq!(table.column("A").unwrap(), &[1.1, 1.2, 1.3]);
        assert_eq!(table.column("B").unwrap(), &[2.1, 2.2, 2.3]);
    }

    #[test]
    fn test_dropping_one_timestamp_removes_row() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(0, 1.0), (1, 1.1), (2, 1.2)]));
        input.insert("B".to_string(), series(&[(0, 2.0), (1, 2.1), (2, 2.2)]));
        input.insert("C".to_string(), series(&[(0, 3.0), (2, 3.2)]));

        let table = PriceTable::align(&input, &universe(&["A", "B", "C"])).unwrap();

        assert_eq!(table.index(), &[hour(0), hour(2)]);
        assert_eq!(table.symbols(), &universe(&["A", "B", "C"])[..]);
    }

    #[test]
    fn test_non_finite_counts_as_missing() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(0, 1.0), (1, f64::NAN), (2, 1.2)]));
        input.insert("B".to_string(), series(&[(0, 2.0), (1, 2.1), (2, 2.2)]));

        let table = PriceTable::align(&input, &universe(&["A", "B"])).unwrap();
        assert_eq!(table.index(), &[hour(0), hour(2)]);
    }

    #[test]
    fn test_unsorted_and_duplicate_input() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(2, 1.2), (0, 1.0), (1, 1.1), (1, 1.15)]));
        input.insert("B".to_string(), series(&[(0, 2.0), (1, 2.1), (2, 2.2)]));

        let table = PriceTable::align(&input, &universe(&["A", "B"])).unwrap();
        assert_eq!(table.column("A").unwrap(), &[1.0, 1.15, 1.2]);
    }

    #[test]
    fn test_disjoint_ranges_give_empty_table() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(0, 1.0), (1, 1.1)]));
        input.insert("B".to_string(), series(&[(5, 2.0), (6, 2.1)]));

        let table = PriceTable::align(&input, &universe(&["A", "B"])).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column("A").unwrap().len(), 0);
    }

    #[test]
    fn test_missing_symbol_is_named() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), series(&[(0, 1.0)]));

        let err = PriceTable::align(&input, &universe(&["A", "B"])).unwrap_err();
        assert_eq!(err, AlignError::MissingSymbol("B".to_string()));
        assert!(err.to_string().contains('B'));
    }

    #[test]
    fn test_from_columns_validation() {
        let ok = PriceTable::from_columns(
            vec![hour(0), hour(1)],
            universe(&["A", "B"]),
            vec![vec![1.0, 1.1], vec![2.0, 2.1]],
        );
        assert!(ok.is_ok());

        let unordered = PriceTable::from_columns(
            vec![hour(1), hour(0)],
            universe(&["A"]),
            vec![vec![1.0, 1.1]],
        );
        assert_eq!(unordered.unwrap_err(), AlignError::UnorderedIndex(1));

        let short = PriceTable::from_columns(
            vec![hour(0), hour(1)],
            universe(&["A"]),
            vec![vec![1.0]],
        );
        assert!(matches!(short.unwrap_err(), AlignError::LengthMismatch { .. }));

        let gap = PriceTable::from_columns(
            vec![hour(0), hour(1)],
            universe(&["A"]),
            vec![vec![1.0, f64::NAN]],
        );
        assert!(matches!(gap.unwrap_err(), AlignError::MissingValue { row: 1, .. }));
    }
}
