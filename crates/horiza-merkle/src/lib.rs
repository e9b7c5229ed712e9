// crates/horiza-merkle/src/lib.rs
//
// horiza-merkle: off-chain builder for holder reward trees.
//
// Pipeline:
//   HolderSnapshot -> shares (locked_amount * holder_pool / total_locked)
//                  -> ClaimTree (sorted keccak256 leaves, sorted-pair nodes)
//                  -> Distribution (root + per-account amount and proof)
//
// The tree layout matches merkletreejs with `{ hashLeaves: true, sort: true }`
// so roots agree with trees built by EVM tooling.

pub mod distribution;
pub mod shares;
pub mod tree;

pub use distribution::{ClaimEntry, Distribution};
pub use shares::{compute_shares, Share};
pub use tree::ClaimTree;
