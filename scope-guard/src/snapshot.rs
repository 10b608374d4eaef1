//! Persistent policy snapshots
//!
//! A snapshot captures the owner and every target record so a guard can be
//! rebuilt elsewhere with an equivalent end state.

use scope_guard_api::{Address, TargetPermission, SNAPSHOT_VERSION};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Error type for snapshot persistence
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// One target record inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub address: Address,
    #[serde(flatten)]
    pub permission: TargetPermission,
}

/// Complete guard state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSnapshot {
    pub version: u32,
    /// `None` while the guard is uninitialized
    #[serde(default)]
    pub owner: Option<Address>,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

impl Default for GuardSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardSnapshot {
    /// Empty snapshot of an uninitialized guard
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            owner: None,
            targets: Vec::new(),
        }
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path.as_ref())?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Load from a JSON file, or start empty if it does not exist yet
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save as pretty JSON, creating parent directories if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Fail unless this snapshot uses the supported format
    pub fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// Look up the record for an address
    pub fn target(&self, address: &Address) -> Option<&TargetPermission> {
        self.targets
            .iter()
            .find(|entry| &entry.address == address)
            .map(|entry| &entry.permission)
    }

    /// Stable hash of the effective policy
    ///
    /// Inert records are skipped, so a target that was configured and then
    /// fully revoked does not change the fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.version.to_be_bytes());
        match self.owner {
            Some(owner) => {
                hasher.update(&[1]);
                hasher.update(owner.as_slice());
            }
            None => {
                hasher.update(&[0]);
            }
        }

        let mut active: Vec<&TargetEntry> = self
            .targets
            .iter()
            .filter(|entry| !entry.permission.is_inert())
            .collect();
        active.sort_by_key(|entry| entry.address);

        // Every variable-length part is length-prefixed
        hasher.update(&(active.len() as u64).to_be_bytes());
        for entry in active {
            let permission = &entry.permission;
            hasher.update(entry.address.as_slice());
            hasher.update(&[
                permission.clearance as u8,
                u8::from(permission.execution_options),
            ]);
            hasher.update(&(permission.allowed_functions.len() as u64).to_be_bytes());
            for selector in &permission.allowed_functions {
                hasher.update(selector.as_slice());
            }
        }

        hasher.finalize().to_hex().to_string()
    }
}
