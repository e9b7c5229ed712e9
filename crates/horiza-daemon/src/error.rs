// crates/horiza-daemon/src/error.rs
//
// Daemon-level errors: persistence, lifecycle, and engine failures surfaced
// by background tasks.

use thiserror::Error;

use horiza_core::HorizaError;

use crate::state::NodeState;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Engine error: {0}")]
    Engine(#[from] HorizaError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported state file version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: NodeState, to: NodeState },
}

pub type DaemonResult<T> = std::result::Result<T, DaemonError>;
