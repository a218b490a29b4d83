//! Deployment log lookups.
//!
//! Deploy scripts record every contract they deploy in a JSON object per
//! (log prefix, network), stored as `<log_dir>/<prefix>_<network>.log`:
//!
//! ```text
//! log/deploy_zklink_OPTIMISM.log
//! {
//!   "deployer": "0x...",
//!   "zkLinkProxy": "0x...",
//!   "zkLinkProxyBlockNumber": 115436021
//! }
//! ```
//!
//! Lookups never cache: every call re-reads the file, so a log rewritten by a
//! concurrent deployment is always observed.

use alloy_primitives::Address;
use serde_json::{Map, Value};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DeployLogError {
    /// The log exists but could not be read.
    #[error("failed to read deploy log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The log is not a JSON object.
    #[error("deploy log {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The entry exists but does not hold an address.
    #[error("entry {entry} in deploy log {path} is not an address: {value}")]
    InvalidAddress {
        path: PathBuf,
        entry: String,
        value: String,
    },
}

/// Read-only view over a directory of deploy logs.
#[derive(Debug, Clone)]
pub struct DeployLogResolver {
    log_dir: PathBuf,
}

impl DeployLogResolver {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the log holding `log_prefix` artifacts for `network`.
    pub fn log_path(&self, log_prefix: &str, network: &str) -> PathBuf {
        self.log_dir.join(format!("{log_prefix}_{network}.log"))
    }

    /// Resolve a deployed address.
    ///
    /// Returns `Ok(None)` when the log file or the entry does not exist.
    pub fn resolve(
        &self,
        log_prefix: &str,
        entry_name: &str,
        network: &str,
    ) -> Result<Option<Address>, DeployLogError> {
        let path = self.log_path(log_prefix, network);
        let Some(value) = self.read_field(&path, entry_name)? else {
            debug!(path = %path.display(), entry = entry_name, "Deploy log entry not found");
            return Ok(None);
        };

        let invalid = || DeployLogError::InvalidAddress {
            path: path.clone(),
            entry: entry_name.to_string(),
            value: value.to_string(),
        };
        let address = value
            .as_str()
            .ok_or_else(invalid)?
            .parse::<Address>()
            .map_err(|_| invalid())?;

        debug!(
            path = %path.display(),
            entry = entry_name,
            %address,
            "Resolved deployment address"
        );

        Ok(Some(address))
    }

    /// Read a raw field from a log, `None` if the file or the field is absent.
    fn read_field(&self, path: &Path, field: &str) -> Result<Option<Value>, DeployLogError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DeployLogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut entries: Map<String, Value> =
            serde_json::from_str(&contents).map_err(|e| DeployLogError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(entries.remove(field).filter(|value| !value.is_null()))
    }
}
