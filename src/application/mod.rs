//! Application Layer - Use cases over the ports
//!
//! - `pipeline`: the batch pairs pipeline with date-keyed memoization
//! - `report`: what one run produced

pub mod pipeline;
pub mod report;

pub use pipeline::{CacheMode, PairsPipeline, PipelineError};
pub use report::{LatestSignal, PipelineReport};
