//! Artifact Store Port
//!
//! Date-keyed storage for the pipeline's intermediate results. A stored
//! artifact for today's date lets a later run skip the matching computation.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::domain::{PairValues, SymbolPair, ZScoreSeries};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("Failed to serialize {artifact}: {reason}")]
    SerializationError { artifact: String, reason: String },

    #[error("Failed to read {artifact}: {reason}")]
    ReadError { artifact: String, reason: String },

    #[error("Failed to write {artifact}: {reason}")]
    WriteError { artifact: String, reason: String },

    #[error("{artifact} is corrupted: {reason}")]
    CorruptedFile { artifact: String, reason: String },

    #[error("Failed to create directory {path}: {reason}")]
    DirectoryError { path: String, reason: String },
}

/// Kind of per-pair scalar artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Significant cointegration p-values
    CointegrationPValues,
    /// Stationary spread ADF p-values
    StationarityPValues,
    /// Final hedge ratios, after stationarity pruning
    HedgeRatios,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::CointegrationPValues,
        ArtifactKind::StationarityPValues,
        ArtifactKind::HedgeRatios,
    ];

    /// Name component used in storage keys
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::CointegrationPValues => "coint_values",
            ArtifactKind::StationarityPValues => "spread_adf_values",
            ArtifactKind::HedgeRatios => "hedge_ratios",
        }
    }
}

/// Artifact identity: run date plus kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub date: NaiveDate,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(date: NaiveDate, kind: ArtifactKind) -> Self {
        Self { date, kind }
    }

    /// "{dd-mm-yy}_{kind}", e.g. "07-03-24_coint_values"
    pub fn stem(&self) -> String {
        format!("{}_{}", self.date.format("%d-%m-%y"), self.kind.name())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}

/// Storage for pipeline artifacts
pub trait ArtifactStore: Send + Sync {
    /// Stored values for `key`, or `None` if nothing was stored yet
    fn get(&self, key: &ArtifactKey) -> Result<Option<PairValues>, PersistError>;

    /// Store (replacing) the values for `key`
    fn put(&self, key: &ArtifactKey, values: &PairValues) -> Result<(), PersistError>;

    /// Store the z-score series of one pair, replacing any previous series
    fn put_zscores(&self, pair: &SymbolPair, series: &ZScoreSeries) -> Result<(), PersistError>;
}
