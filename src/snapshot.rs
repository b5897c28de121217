//! Keyed on-disk snapshots of raw batch responses.
//!
//! One snapshot per entity batch, written before the batch is consumed. A
//! rerun loads existing snapshots instead of re-querying, which is what
//! makes interrupted runs resumable and warm reruns free of network cost.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EnrichResult;
use crate::wdqs::types::SparqlResults;

/// Batch index -> raw response store. The filesystem implementation below
/// can be swapped for a database without touching orchestration logic.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, batch_index: usize) -> EnrichResult<Option<SparqlResults>>;
    fn store(&self, batch_index: usize, results: &SparqlResults) -> EnrichResult<()>;
}

/// Stores one JSON file per batch under a cache directory.
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Open the store, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> EnrichResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, batch_index: usize) -> PathBuf {
        self.dir
            .join(format!("wdqs_people_locations_{batch_index:04}.json"))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self, batch_index: usize) -> EnrichResult<Option<SparqlResults>> {
        let path = self.path_for(batch_index);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn store(&self, batch_index: usize, results: &SparqlResults) -> EnrichResult<()> {
        write_json_atomic(&self.path_for(batch_index), results)
    }
}

/// Serialize to a sibling temp file, then rename into place. A crash
/// mid-write leaves either the previous file or none, never a truncated
/// one.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> EnrichResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let text = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
