//! pairs-scout - Cointegrated pairs screening library
//!
//! Finds statistically related symbol pairs in aligned closing prices and
//! turns their spreads into rolling z-scores.
//!
//! # Modules
//!
//! - `domain`: Core data model (SymbolPair, PriceTable, SpreadTable, ZScoreSeries)
//! - `ports`: Trait abstractions (MarketDataPort, ArtifactStore)
//! - `strategy`: Statistics (OLS, ADF, Engle-Granger, hedge ratios, z-scores)
//! - `adapters`: External implementations (CSV bars, artifact files, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: The pairs pipeline and its run report

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
