// crates/horiza-economics/src/epoch.rs
//
// Global epoch clock.
//
// The epoch counter advances by exactly one per `advance` call, and only
// once a full epoch duration has passed since the previous advance. The
// reference point moves forward by one duration per advance rather than
// snapping to `now`, so a clock that fell behind can catch up one epoch per
// call without drifting.

use serde::{Deserialize, Serialize};

use horiza_core::{Epoch, HorizaError, Result, Timestamp};

/// Default epoch length: one week in seconds.
pub const ONE_WEEK: u64 = 604_800;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochClock {
    current_epoch: Epoch,
    epoch_duration: u64,
    last_advance: Timestamp,
}

impl EpochClock {
    /// Start at epoch 0 with `genesis` as the first reference point.
    ///
    /// # Errors
    /// `InvalidInput` if `epoch_duration` is zero.
    pub fn new(epoch_duration: u64, genesis: Timestamp) -> Result<Self> {
        if epoch_duration == 0 {
            return Err(HorizaError::InvalidInput(
                "epoch duration must be positive".to_string(),
            ));
        }
        Ok(Self {
            current_epoch: 0,
            epoch_duration,
            last_advance: genesis,
        })
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current_epoch
    }

    pub fn epoch_duration(&self) -> u64 {
        self.epoch_duration
    }

    /// Timestamp of the most recent advance (or genesis).
    pub fn last_advance(&self) -> Timestamp {
        self.last_advance
    }

    /// Earliest timestamp at which the next advance succeeds.
    pub fn next_epoch_at(&self) -> Timestamp {
        self.last_advance.saturating_add(self.epoch_duration)
    }

    pub fn is_elapsed(&self, now: Timestamp) -> bool {
        now >= self.next_epoch_at()
    }

    /// Seconds left until the next advance is allowed (0 if already due).
    pub fn seconds_until_next(&self, now: Timestamp) -> u64 {
        self.next_epoch_at().saturating_sub(now)
    }

    /// Move to the next epoch. Returns the new epoch number.
    ///
    /// # Errors
    /// `EpochNotElapsed` if called before `next_epoch_at()`.
    pub fn advance(&mut self, now: Timestamp) -> Result<Epoch> {
        let next_epoch_at = self.next_epoch_at();
        if now < next_epoch_at {
            return Err(HorizaError::EpochNotElapsed { next_epoch_at, now });
        }
        self.last_advance = next_epoch_at;
        self.current_epoch += 1;
        Ok(self.current_epoch)
    }
}
