// crates/horiza-daemon/src/epoch_events.rs
//
// Epoch event types broadcast from the scheduler to daemon tasks.
//
// The EpochScheduler publishes events on a tokio broadcast channel; the
// event logger in main.rs subscribes, and tests subscribe to observe
// scheduler progress.

use std::path::PathBuf;

use horiza_core::{Epoch, Timestamp};
use horiza_economics::EmissionSplit;

/// Events emitted by the epoch scheduler.
#[derive(Debug, Clone)]
pub enum EpochEvent {
    /// The epoch clock advanced.
    EpochAdvanced {
        /// The new epoch number (just started).
        epoch: Epoch,
        /// Scheduler time at which the advance ran.
        at: Timestamp,
    },
    /// Emission for an epoch was split and distributed.
    EmissionDistributed { split: EmissionSplit },
    /// A holder snapshot was written for the off-chain tree builder.
    SnapshotWritten {
        epoch: Epoch,
        holders: usize,
        path: PathBuf,
    },
}
