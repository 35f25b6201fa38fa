//! Artifact Storage Adapters
//!
//! - `FileArtifactStore`: JSON and CSV files on local disk
//! - `MemoryArtifactStore`: process-local maps, for tests and dry runs

mod file_store;
mod memory_store;

pub use file_store::{FileArtifactStore, ZSCORE_HEADER};
pub use memory_store::MemoryArtifactStore;
