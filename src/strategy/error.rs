//! Statistical Errors
//!
//! Failures that affect a single series or pair. The pipeline records them as
//! omissions and keeps going with the remaining pairs.

use std::fmt;
use thiserror::Error;

use crate::domain::SymbolPair;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatError {
    #[error("insufficient data: requires {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("regression design matrix is singular")]
    SingularDesign,

    #[error("series are perfectly collinear")]
    PerfectFit,

    #[error("non-positive price {price} for {symbol} at row {row}")]
    NonPositivePrice { symbol: String, row: usize, price: f64 },

    #[error("non-finite value at row {0}")]
    NonFinite(usize),

    #[error("series is constant")]
    ConstantSeries,

    #[error("test statistic is undefined")]
    UndefinedStatistic,
}

/// Pipeline stage a per-pair failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cointegration,
    HedgeRatio,
    Stationarity,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Cointegration => write!(f, "cointegration"),
            Stage::HedgeRatio => write!(f, "hedge ratio"),
            Stage::Stationarity => write!(f, "stationarity"),
        }
    }
}

/// A pair excluded from the results, with the reason
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{pair}: {stage} failed: {source}")]
pub struct PairFailure {
    pub pair: SymbolPair,
    pub stage: Stage,
    #[source]
    pub source: StatError,
}

impl PairFailure {
    pub fn new(pair: SymbolPair, stage: Stage, source: StatError) -> Self {
        Self { pair, stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_names_pair() {
        let failure = PairFailure::new(
            "EURUSD_GBPUSD".parse().unwrap(),
            Stage::HedgeRatio,
            StatError::NonPositivePrice {
                symbol: "GBPUSD".to_string(),
                row: 12,
                price: 0.0,
            },
        );

        let message = failure.to_string();
        assert!(message.contains("EURUSD_GBPUSD"));
        assert!(message.contains("GBPUSD at row 12"));
        assert!(message.contains("hedge ratio"));
    }
}
