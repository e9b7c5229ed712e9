// crates/horiza-economics/src/lib.rs
//
// horiza-economics: the Horiza voting-escrow state machine.
//
// Components, leaf-first:
//   - LockRegistry: lock positions, decaying voting power, holder enumeration.
//   - EpochClock: global epoch counter gated by a fixed wall-clock interval.
//   - GaugeRegistry: strategy gauges, per-epoch vote tallies, reward rates.
//   - EmissionController: weekly emission, team/LP/holder split, Merkle claims.
//   - Protocol: the single-writer engine that runs every operation atomically.
//
// All monetary values are tracked in wei (the smallest unit of HZ).
// 1 HZ = 10^18 wei.

pub mod emission;
pub mod epoch;
pub mod gauge;
pub mod ledger;
pub mod lock;
pub mod protocol;
pub mod roles;
pub mod snapshot;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use emission::{
    EmissionController, EmissionPolicy, EmissionSplit, EmissionState, MerkleDistributor,
    BPS_DENOMINATOR, DEFAULT_EMISSION_DECAY_BPS, DEFAULT_HOLDER_BPS, DEFAULT_TEAM_BPS,
    INITIAL_WEEKLY_EMISSION,
};
pub use epoch::{EpochClock, ONE_WEEK};
pub use gauge::{Ballot, FinalizedTally, Gauge, GaugeRegistry};
pub use ledger::{InMemoryLedger, LedgerJournal};
pub use lock::{
    voting_power, Lock, LockRegistry, BASE_PERCENTAGE, MAX_EPOCHS, POWER_INCREASE_PERCENTAGE,
};
pub use protocol::{EpochStatus, Protocol, ProtocolConfig, ProtocolState};
pub use roles::Roles;
pub use snapshot::{HolderEntry, HolderSnapshot};
pub use token::{mul_div, Hz, WEI_PER_HZ};
