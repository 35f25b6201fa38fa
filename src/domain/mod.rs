//! Domain Layer - Core data model for the pairs pipeline
//!
//! Pure types with no I/O. All external interactions happen through the
//! ports layer.
//!
//! - `pair`: ordered symbol pairs and their textual "A_B" keys
//! - `price_table`: time-aligned closing prices for the symbol universe
//! - `series`: spread and z-score series sharing the price table's index

pub mod pair;
pub mod price_table;
pub mod series;

pub use pair::{PairKeyError, SymbolPair, PAIR_SEPARATOR};
pub use price_table::{AlignError, PricePoint, PriceSeries, PriceTable};
pub use series::{PairValues, SignalBand, SpreadTable, ZScore, ZScoreSeries};
