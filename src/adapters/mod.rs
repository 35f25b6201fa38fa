//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: exported CSV bar files
//! - Storage: JSON/CSV artifact files and an in-memory store
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod market_data;
pub mod storage;

pub use cli::CliApp;
pub use market_data::CsvBarSource;
pub use storage::{FileArtifactStore, MemoryArtifactStore};
