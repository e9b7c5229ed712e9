// crates/horiza-core/src/lib.rs
//
// horiza-core: Core types, errors, the ledger capability, and Merkle
// primitives for the Horiza Protocol.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the identifiers and amounts used by the voting-escrow engine,
// the protocol-wide error type, and the keccak256 hashing that the holder
// reward distributor verifies claims with.

pub mod crypto;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use horiza_core::Address;`

pub use types::{Address, Amount, Epoch, GaugeId, Hash32, LockId, Timestamp};

// Error type
pub use error::{HorizaError, Result};

// Traits
pub use traits::Ledger;

// Merkle primitives
pub use crypto::{claim_leaf, hash_sorted_pair, keccak256, process_proof, verify_proof};
