//! Market Data Adapters
//!
//! - `CsvBarSource`: exported bar files on local disk, one per symbol

mod csv_bars;

pub use csv_bars::{parse_bars, CsvBarSource};
