//! Market Data Port
//!
//! Historical closing prices for a symbol universe over a time range. Broker
//! metadata (volume, spread, OHLC) is dropped by the adapter; the core only
//! ever sees timestamp/close points.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::PriceSeries;

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("No data source for symbol {0}")]
    UnknownSymbol(String),

    #[error("Failed to read bars for {symbol}: {source}")]
    Io {
        symbol: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Data parsing error for {symbol} at line {line}: {reason}")]
    ParseError {
        symbol: String,
        line: usize,
        reason: String,
    },

    #[error("Bar at {timestamp} for {symbol} is not aligned to the {timeframe} timeframe")]
    ResolutionMismatch {
        symbol: String,
        timeframe: Timeframe,
        timestamp: DateTime<Utc>,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Market data source unavailable: {0}")]
    Unavailable(String),
}

/// Supported bar sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Bar length
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::M30 => Duration::minutes(30),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    /// True if `timestamp` falls on a bar boundary
    pub fn is_aligned(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp.timestamp().rem_euclid(self.duration().num_seconds()) == 0
            && timestamp.timestamp_subsec_nanos() == 0
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Timeframe {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(MarketDataError::InvalidQuery(format!("unknown timeframe '{}'", other))),
        }
    }
}

/// Historical closes query
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub symbols: Vec<String>,
}

impl PriceQuery {
    /// Query covering `lookback` up to `end`
    pub fn lookback(timeframe: Timeframe, end: DateTime<Utc>, lookback: Duration, symbols: Vec<String>) -> Self {
        Self {
            timeframe,
            start: end - lookback,
            end,
            symbols,
        }
    }

    /// Inclusive range check
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.symbols.is_empty() {
            return Err(MarketDataError::InvalidQuery("no symbols requested".into()));
        }
        if self.start >= self.end {
            return Err(MarketDataError::InvalidQuery(format!(
                "start {} is not before end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Market data port trait
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Closing prices per requested symbol within the query range
    async fn fetch_closes(&self, query: &PriceQuery) -> Result<HashMap<String, PriceSeries>, MarketDataError>;
}
