//! File Artifact Store
//!
//! JSON documents `{artifact_dir}/{dd-mm-yy}_{kind}.json` holding `{"A_B": value}`
//! maps, and one `time,z-score` CSV per pair at `{zscore_dir}/{A_B}.csv`. Every write goes to a
//! temporary sibling file that is renamed over the target, so a failed write
//! never leaves a truncated artifact behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::{PairValues, SymbolPair, ZScore, ZScoreSeries};
use crate::ports::artifact_store::{ArtifactKey, ArtifactStore, PersistError};

/// Header of per-pair z-score files
pub const ZSCORE_HEADER: &str = "time,z-score";

#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    artifact_dir: PathBuf,
    zscore_dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(artifact_dir: impl Into<PathBuf>, zscore_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            zscore_dir: zscore_dir.into(),
        }
    }

    pub fn artifact_path(&self, key: &ArtifactKey) -> PathBuf {
        self.artifact_dir.join(format!("{}.json", key.stem()))
    }

    pub fn zscore_path(&self, pair: &SymbolPair) -> PathBuf {
        self.zscore_dir.join(format!("{}.csv", pair))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<PairValues>, PersistError> {
        let path = self.artifact_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| PersistError::ReadError {
            artifact: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let values: PairValues = serde_json::from_str(&content).map_err(|e| PersistError::CorruptedFile {
            artifact: path.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Loaded {} ({} pairs)", path.display(), values.len());
        Ok(Some(values))
    }

    fn put(&self, key: &ArtifactKey, values: &PairValues) -> Result<(), PersistError> {
        let path = self.artifact_path(key);
        let content = serde_json::to_string_pretty(values).map_err(|e| PersistError::SerializationError {
            artifact: key.to_string(),
            reason: e.to_string(),
        })?;

        write_atomic(&path, |writer| writer.write_all(content.as_bytes()))?;

        tracing::info!("Saved {} ({} pairs)", path.display(), values.len());
        Ok(())
    }

    fn put_zscores(&self, pair: &SymbolPair, series: &ZScoreSeries) -> Result<(), PersistError> {
        let path = self.zscore_path(pair);

        write_atomic(&path, |writer| {
            let mut out = csv::Writer::from_writer(writer);
            out.write_record(ZSCORE_HEADER.split(','))?;
            for (timestamp, z) in series.iter() {
                let value = match z {
                    ZScore::Value(value) => value.to_string(),
                    ZScore::Insufficient | ZScore::Flat => String::new(),
                };
                out.write_record([timestamp.to_rfc3339(), value])?;
            }
            out.flush()
        })?;

        tracing::debug!("Saved z-scores for {} to {}", pair, path.display());
        Ok(())
    }
}

/// Write through a buffered temp file, then rename it onto `path`.
/// The file handle is closed before the rename on every path.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let artifact = path.display().to_string();
    let write_error = |e: std::io::Error| PersistError::WriteError {
        artifact: artifact.clone(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistError::DirectoryError {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    let result = File::create(&tmp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_error(e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_error(e)
    })
}
