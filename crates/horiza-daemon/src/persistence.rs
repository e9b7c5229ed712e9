// crates/horiza-daemon/src/persistence.rs
//
// On-disk engine state.
//
// Layout under the data directory:
//   state.json                  full engine state plus the in-memory ledger
//   snapshots/epoch-<n>.json    holder snapshots for the off-chain tree builder
//
// Files are written to a temporary sibling and renamed into place, so a
// crash mid-write leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use horiza_economics::{HolderSnapshot, InMemoryLedger, ProtocolState};
use horiza_rpc::Engine;

use crate::error::{DaemonError, DaemonResult};

/// Bumped whenever the persisted layout changes incompatibly.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEngine {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: ProtocolState,
    pub ledger: InMemoryLedger,
}

/// Reads and writes engine state under a data directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn snapshot_path(&self, epoch: u64) -> PathBuf {
        self.root.join("snapshots").join(format!("epoch-{}.json", epoch))
    }

    /// Load the persisted engine, or `None` when no state file exists yet.
    pub fn load(&self) -> DaemonResult<Option<Engine>> {
        let path = self.state_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&path, source)),
        };

        let persisted: PersistedEngine =
            serde_json::from_slice(&bytes).map_err(|source| DaemonError::Corrupt {
                path: path.display().to_string(),
                source,
            })?;
        if persisted.version != STATE_VERSION {
            return Err(DaemonError::UnsupportedVersion {
                found: persisted.version,
                expected: STATE_VERSION,
            });
        }

        tracing::info!(
            path = %path.display(),
            saved_at = %persisted.saved_at,
            epoch = persisted.state.clock.current_epoch(),
            locks = persisted.state.locks.len(),
            "Loaded engine state"
        );
        Ok(Some(Engine::from_parts(persisted.state, persisted.ledger)))
    }

    /// Persist the engine state and ledger.
    pub fn save(&self, state: ProtocolState, ledger: InMemoryLedger) -> DaemonResult<PathBuf> {
        let persisted = PersistedEngine {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            state,
            ledger,
        };
        let path = self.state_path();
        write_json(&path, &persisted)?;
        tracing::debug!(path = %path.display(), "Engine state saved");
        Ok(path)
    }

    /// Write the holder snapshot for its epoch.
    pub fn write_snapshot(&self, snapshot: &HolderSnapshot) -> DaemonResult<PathBuf> {
        let path = self.snapshot_path(snapshot.epoch);
        write_json(&path, snapshot)?;
        tracing::info!(
            epoch = snapshot.epoch,
            holders = snapshot.holders.len(),
            path = %path.display(),
            "Holder snapshot written"
        );
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> DaemonResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|source| DaemonError::Corrupt {
        path: path.display().to_string(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.display().to_string(),
        source,
    }
}
