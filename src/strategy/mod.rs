//! Strategy Layer - Statistical pairs pipeline
//!
//! Pure, synchronous statistics over an aligned price table:
//! - Engle-Granger cointegration screening over ordered symbol pairs
//! - Log-price hedge ratios and spreads
//! - ADF stationarity filtering of the spreads
//! - Rolling z-scores of the surviving spreads
//!
//! Per-pair numeric failures never abort a stage; they come back as
//! `PairFailure` values next to the results.

pub mod adf;
pub mod cointegration;
pub mod error;
pub mod hedge_ratio;
pub mod mackinnon;
pub mod ols;
pub mod params;
pub mod stationarity;
pub mod zscore;

pub use adf::{adf_test, AdfResult, Trend};
pub use cointegration::{engle_granger, CointegrationScreener, EngleGrangerResult, ScreenOutcome};
pub use error::{PairFailure, Stage, StatError};
pub use hedge_ratio::{PairSpread, SpreadEstimator, SpreadOutcome};
pub use mackinnon::CriticalValues;
pub use params::{LagSelection, PairSelection, ParamsError, PipelineConfig};
pub use stationarity::{prune, StationarityFilter, StationarityOutcome};
pub use zscore::ZScoreEngine;
