//! Binary persistence for the engine-owned output tables.
//!
//! The engine's commits are whole-period and idempotent, so durability is a
//! versioned full snapshot of both tables; recovery is load-then-re-run,
//! not log replay.

use super::{CumulativeTable, HistoryTable};
use crate::core::{DimError, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SNAPSHOT_VERSION: u32 = 1;

/// Serialized state of both output tables plus bookkeeping metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub cumulative: CumulativeTable,
    pub history: HistoryTable,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub cumulative_rows: usize,
    pub history_rows: usize,
}

impl StoreSnapshot {
    pub fn new(cumulative: CumulativeTable, history: HistoryTable) -> Self {
        let metadata = SnapshotMetadata {
            created_at: Utc::now(),
            cumulative_rows: cumulative.row_count(),
            history_rows: history.row_count(),
        };
        Self {
            version: SNAPSHOT_VERSION,
            cumulative,
            history,
            metadata,
        }
    }
}

/// Writes and reads `StoreSnapshot`s at a fixed path.
pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Save atomically: serialize into a temp file in the target directory,
    /// sync, then rename over the destination.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let dir = self.snapshot_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| DimError::SerializationError(format!("snapshot encode: {}", e)))?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| DimError::IoError(format!("snapshot rename: {}", e)))?;

        info!(
            "saved store snapshot to {} ({} bytes)",
            self.snapshot_path.display(),
            serialized.len()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            debug!("no store snapshot at {}", self.snapshot_path.display());
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| DimError::SerializationError(format!("snapshot decode: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DimError::SerializationError(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn delete(&self) -> Result<()> {
        if self.snapshot_path.exists() {
            fs::remove_file(&self.snapshot_path)?;
        }
        Ok(())
    }
}
