//! JSON topology snapshots for offline runs of the migration.

use super::{CompactionOptions, HostInfo};
use crate::core::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Hosts plus `keyspace -> table -> compaction options`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default)]
    pub hosts: Vec<HostInfo>,
    #[serde(default)]
    pub keyspaces: BTreeMap<String, BTreeMap<String, CompactionOptions>>,
}

pub struct SnapshotStore {
    snapshot_path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn load(&self) -> Result<TopologySnapshot> {
        let file = File::open(&self.snapshot_path).map_err(|e| {
            MigrationError::IoError(format!("Failed to open snapshot {}: {}", self.snapshot_path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| MigrationError::ConfigError(format!("Failed to parse snapshot: {}", e)))
    }

    /// Write through a temp file in the same directory, then rename over the target.
    pub fn save(&self, snapshot: &TopologySnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| MigrationError::IoError(format!("Failed to create snapshot directory: {}", e)))?;

        let temp = NamedTempFile::new_in(&parent)
            .map_err(|e| MigrationError::IoError(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(temp);
        serde_json::to_writer_pretty(&mut writer, snapshot)
            .map_err(|e| MigrationError::IoError(format!("Failed to serialize snapshot: {}", e)))?;
        writer
            .flush()
            .map_err(|e| MigrationError::IoError(format!("Failed to flush snapshot: {}", e)))?;
        let temp = writer
            .into_inner()
            .map_err(|e| MigrationError::IoError(format!("Failed to flush snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| MigrationError::IoError(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| MigrationError::IoError(format!("Failed to rename snapshot: {}", e)))?;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}
