//! Persisted progress of a relay wait.
//!
//! A relay can take days. The checkpoint keeps the sending transaction hash
//! and the last observed status so an interrupted run picks up where it left
//! off instead of sending a new transaction.

use crate::bridge::MessageStatus;
use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checkpoint {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub task: String,
    pub network: String,
    pub tx_hash: TxHash,
    pub status: MessageStatus,
    /// Unix seconds of the last write
    pub updated_at: u64,
}

impl Checkpoint {
    pub fn new(task: &str, network: &str, tx_hash: TxHash, status: MessageStatus) -> Self {
        Self {
            task: task.to_string(),
            network: network.to_string(),
            tx_hash,
            status,
            updated_at: unix_now(),
        }
    }
}

/// One JSON file per (task, network) in a directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, task: &str, network: &str) -> PathBuf {
        self.dir.join(format!("{task}_{network}.json"))
    }

    pub fn load(&self, task: &str, network: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.path(task, network);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| CheckpointError::Malformed {
                path,
                reason: e.to_string(),
            })
    }

    /// Write through a temporary file so a crash never leaves a torn checkpoint.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let path = self.path(&checkpoint.task, &checkpoint.network);
        let io_err = |source| CheckpointError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        let contents = serde_json::to_vec_pretty(checkpoint).map_err(|e| {
            CheckpointError::Malformed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(
            path = %path.display(),
            tx_hash = %checkpoint.tx_hash,
            status = %checkpoint.status,
            "Checkpoint saved"
        );
        Ok(())
    }

    pub fn clear(&self, task: &str, network: &str) -> Result<(), CheckpointError> {
        let path = self.path(task, network);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CheckpointError::Io { path, source }),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested"));
        let hash = TxHash::repeat_byte(0xab);

        assert_eq!(store.load("sync-l2-requests", "OPTIMISM").unwrap(), None);

        store
            .save(&Checkpoint::new("sync-l2-requests", "OPTIMISM", hash, MessageStatus::Sent))
            .unwrap();
        store
            .save(&Checkpoint::new("sync-l2-requests", "OPTIMISM", hash, MessageStatus::Proven))
            .unwrap();

        let loaded = store.load("sync-l2-requests", "OPTIMISM").unwrap().unwrap();
        assert_eq!(loaded.tx_hash, hash);
        assert_eq!(loaded.status, MessageStatus::Proven);
        assert!(!store.path("sync-l2-requests", "OPTIMISM").with_extension("json.tmp").exists());

        // Other networks are independent
        assert_eq!(store.load("sync-l2-requests", "BASE").unwrap(), None);

        store.clear("sync-l2-requests", "OPTIMISM").unwrap();
        store.clear("sync-l2-requests", "OPTIMISM").unwrap();
        assert_eq!(store.load("sync-l2-requests", "OPTIMISM").unwrap(), None);
    }

    #[test]
    fn test_malformed_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        std::fs::write(store.path("sync-l2-requests", "OPTIMISM"), "{").unwrap();

        assert!(matches!(
            store.load("sync-l2-requests", "OPTIMISM"),
            Err(CheckpointError::Malformed { .. })
        ));
    }
}
