//! Treasury Storage Layer - File-Based Ledger Snapshots
//!
//! The ledger lives in memory; snapshots are written after mutations worth
//! keeping and read back on startup:
//! - `<name>.json` human-readable copy
//! - `<name>.bin` bincode copy, preferred when loading

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use treasury::{Address, TokenBank, Treasury, TreasurySnapshot};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

/// Snapshot plus the time it was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub saved_at: u64,
    pub snapshot: TreasurySnapshot,
}

/// Directory of ledger snapshots
pub struct LedgerStore {
    data_dir: PathBuf,
}

impl LedgerStore {
    /// Open storage directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let data_dir = path.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    /// Snapshot name used for a treasury address
    pub fn name_for(treasury_address: &Address) -> String {
        let cleaned: String = treasury_address
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("treasury-{}", cleaned)
    }

    pub fn save(
        &self,
        name: &str,
        snapshot: &TreasurySnapshot,
        saved_at: u64,
    ) -> Result<(), StorageError> {
        let stored = StoredSnapshot {
            saved_at,
            snapshot: snapshot.clone(),
        };

        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.json_path(name), json)?;

        let bin = bincode::serialize(&stored)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.bin_path(name), bin)?;

        debug!("Saved snapshot {} ({} events)", name, snapshot.events.len());
        Ok(())
    }

    /// Checkpoint a live treasury under its address-derived name
    pub fn save_treasury<B: TokenBank>(
        &self,
        treasury: &Treasury<B>,
        saved_at: u64,
    ) -> Result<String, StorageError> {
        let name = Self::name_for(treasury.treasury_address());
        self.save(&name, &treasury.snapshot(), saved_at)?;
        info!(
            "Checkpointed treasury {} at {}",
            treasury.treasury_address(),
            saved_at
        );
        Ok(name)
    }

    /// Load a snapshot (tries bincode first, falls back to JSON)
    pub fn load(&self, name: &str) -> Result<StoredSnapshot, StorageError> {
        let bin_path = self.bin_path(name);
        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        let json_path = self.json_path(name);
        if json_path.exists() {
            let data = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.bin_path(name).exists() || self.json_path(name).exists()
    }

    /// Names of all stored snapshots, sorted
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_snapshot = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("json") | Some("bin")
            );
            if !is_snapshot {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<(), StorageError> {
        for path in [self.bin_path(name), self.json_path(name)] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    fn bin_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.bin", name))
    }
}
