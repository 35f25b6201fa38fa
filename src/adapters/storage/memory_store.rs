//! In-memory artifact store for tests and dry runs

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{PairValues, SymbolPair, ZScoreSeries};
use crate::ports::artifact_store::{ArtifactKey, ArtifactStore, PersistError};

#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<ArtifactKey, PairValues>>,
    zscores: Mutex<BTreeMap<SymbolPair, ZScoreSeries>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored z-score series for `pair`
    pub fn zscores(&self, pair: &SymbolPair) -> Option<ZScoreSeries> {
        lock(&self.zscores).get(pair).cloned()
    }

    /// Pairs with a stored z-score series
    pub fn zscore_pairs(&self) -> Vec<SymbolPair> {
        lock(&self.zscores).keys().cloned().collect()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        lock(&self.artifacts).contains_key(key)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<PairValues>, PersistError> {
        Ok(lock(&self.artifacts).get(key).cloned())
    }

    fn put(&self, key: &ArtifactKey, values: &PairValues) -> Result<(), PersistError> {
        lock(&self.artifacts).insert(*key, values.clone());
        Ok(())
    }

    fn put_zscores(&self, pair: &SymbolPair, series: &ZScoreSeries) -> Result<(), PersistError> {
        lock(&self.zscores).insert(pair.clone(), series.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
