// crates/horiza-economics/src/snapshot.rs
//
// Holder snapshot for off-chain reward computation.
//
// The Merkle tree builder consumes this: it lists every holder (in holder
// registry order) with its locked principal, next to the size of the holder
// pool the tree should distribute.

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Epoch, Hash32};

use crate::lock::LockRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderEntry {
    pub address: Address,
    #[serde(with = "amount_string")]
    pub locked_amount: Amount,
    #[serde(with = "amount_string")]
    pub power: Amount,
    pub lock_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    pub epoch: Epoch,
    #[serde(with = "amount_string")]
    pub total_locked: Amount,
    /// Holder pool available to claims when the snapshot was taken.
    #[serde(with = "amount_string")]
    pub holder_pool: Amount,
    /// Root the distributor held when the snapshot was taken.
    pub merkle_root: Option<Hash32>,
    pub holders: Vec<HolderEntry>,
}

impl HolderSnapshot {
    pub fn capture(
        locks: &LockRegistry,
        epoch: Epoch,
        holder_pool: Amount,
        merkle_root: Option<Hash32>,
    ) -> Self {
        let holders = locks
            .holders()
            .iter()
            .map(|address| HolderEntry {
                address: *address,
                locked_amount: locks.locked_amount_of(address),
                power: locks.power_of_owner(address),
                lock_count: locks.balance_of(address),
            })
            .collect();

        Self {
            epoch,
            total_locked: locks.total_locked(),
            holder_pool,
            merkle_root,
            holders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::lock::MAX_EPOCHS;

    #[test]
    fn test_capture_lists_holders_in_order() {
        let alice = Address([0xa1; 20]);
        let bob = Address([0xb0; 20]);
        let mut ledger = InMemoryLedger::with_balances([(alice, 1_000), (bob, 1_000)]).unwrap();
        let mut locks = LockRegistry::new();
        locks.lock(&mut ledger, &bob, 300, MAX_EPOCHS, 0).unwrap();
        locks.lock(&mut ledger, &alice, 100, 52, 0).unwrap();
        locks.lock(&mut ledger, &bob, 200, MAX_EPOCHS, 0).unwrap();

        let snapshot = HolderSnapshot::capture(&locks, 4, 77, None);
        assert_eq!(snapshot.total_locked, 600);
        assert_eq!(snapshot.holders.len(), 2);
        assert_eq!(snapshot.holders[0].address, bob);
        assert_eq!(snapshot.holders[0].locked_amount, 500);
        assert_eq!(snapshot.holders[0].lock_count, 2);
        assert_eq!(snapshot.holders[1].power, 50);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["holder_pool"], "77");
    }
}
