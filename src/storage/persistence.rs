//! Snapshot persistence for the storage engine.
//!
//! Snapshot-only: the whole table set is encoded as one MessagePack document
//! and swapped into place atomically. There is no write-ahead log here — DDL
//! in this system is fire-and-forget with no rollback coordination.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{DbError, Result};

use super::Table;

const SNAPSHOT_FILE: &str = "reportdb.snapshot";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseSnapshot {
    version: u32,
    tables: HashMap<String, Table>,
}

/// Directory-backed snapshot store.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| DbError::IoError(format!("Failed to create snapshot directory: {}", e)))?;
        Ok(Self { dir })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Load the persisted table set, or `None` on a fresh directory.
    pub fn load(&self) -> Result<Option<HashMap<String, Table>>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)
            .map_err(|e| DbError::IoError(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: DatabaseSnapshot = rmp_serde::from_slice(&bytes)
            .map_err(|e| DbError::ExecutionError(format!("Failed to decode snapshot: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DbError::ExecutionError(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot.tables))
    }

    /// Write a full snapshot: encode to a temp file, then rename into place.
    pub fn save(&self, tables: HashMap<String, Table>) -> Result<()> {
        let snapshot = DatabaseSnapshot {
            version: SNAPSHOT_VERSION,
            tables,
        };
        let bytes = rmp_serde::to_vec(&snapshot)
            .map_err(|e| DbError::ExecutionError(format!("Failed to encode snapshot: {}", e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| DbError::IoError(format!("Failed to create temp snapshot: {}", e)))?;
        tmp.write_all(&bytes)
            .map_err(|e| DbError::IoError(format!("Failed to write snapshot: {}", e)))?;
        tmp.persist(self.snapshot_path())
            .map_err(|e| DbError::IoError(format!("Failed to publish snapshot: {}", e)))?;
        Ok(())
    }
}
