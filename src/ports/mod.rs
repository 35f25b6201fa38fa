//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Historical market data (closing prices per symbol)
//! - Date-keyed artifact storage for pipeline results

pub mod artifact_store;
pub mod market_data;
pub mod mocks;

pub use artifact_store::{ArtifactKey, ArtifactKind, ArtifactStore, PersistError};
pub use market_data::{MarketDataError, MarketDataPort, PriceQuery, Timeframe};
