//! Symbol Pair
//!
//! Ordered pair of instruments. `A_B` and `B_A` are different pairs: the first
//! symbol is the regressand of both the cointegration test and the hedge ratio.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator used in textual pair keys ("EURUSD_GBPUSD")
pub const PAIR_SEPARATOR: char = '_';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairKeyError {
    #[error("pair key '{0}' must have the form A_B")]
    Malformed(String),

    #[error("pair key '{0}' pairs a symbol with itself")]
    SelfPair(String),
}

/// Ordered pair (A, B) of distinct symbols
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolPair {
    first: String,
    second: String,
}

impl SymbolPair {
    /// Create a pair, rejecting self-pairs and symbols containing the separator
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Result<Self, PairKeyError> {
        let first = first.into();
        let second = second.into();

        if first.is_empty()
            || second.is_empty()
            || first.contains(PAIR_SEPARATOR)
            || second.contains(PAIR_SEPARATOR)
        {
            return Err(PairKeyError::Malformed(format!("{}{}{}", first, PAIR_SEPARATOR, second)));
        }
        if first == second {
            return Err(PairKeyError::SelfPair(format!("{}{}{}", first, PAIR_SEPARATOR, second)));
        }

        Ok(Self { first, second })
    }

    /// Symbol whose log-price is regressed (A)
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Symbol used as the regressor (B)
    pub fn second(&self) -> &str {
        &self.second
    }

    /// The same two symbols in the opposite order
    pub fn reversed(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }

    /// Textual key, "{A}_{B}"
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SymbolPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.first, PAIR_SEPARATOR, self.second)
    }
}

impl FromStr for SymbolPair {
    type Err = PairKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(PAIR_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => Self::new(a, b),
            _ => Err(PairKeyError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for SymbolPair {
    type Error = PairKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SymbolPair> for String {
    fn from(pair: SymbolPair) -> Self {
        pair.to_string()
    }
}
