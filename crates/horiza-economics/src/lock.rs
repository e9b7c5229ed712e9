// crates/horiza-economics/src/lock.rs
//
// Voting-escrow lock registry.
//
// A lock holds a principal for a number of epochs (1..=104). Its voting
// power decays linearly with the epochs it has left:
//
//   power = locked_amount * epochs_remaining / MAX_EPOCHS
//
// so a maximum-length lock starts with power equal to its principal and
// reaches zero exactly at maturity. Power is never stored; it is recomputed
// from the two stored fields on every read, which keeps it exact across any
// sequence of increase/extend/merge.
//
// Locks are NFT-like: each has a monotonic id and an owner, owners are
// indexed to their lock ids, and addresses holding at least one lock are
// kept in insertion order for deterministic snapshot enumeration.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Epoch, HorizaError, Ledger, LockId, Result};

/// Maximum lock duration in epochs (two years of weekly epochs).
pub const MAX_EPOCHS: u64 = 104;

/// Fixed-point scale for percentages (parts per million).
pub const BASE_PERCENTAGE: Amount = 1_000_000;

/// Power lost per epoch, in parts per million of the locked amount.
/// 1,000,000 / 104 = 9,615. Rounded, so it is informational only: 104 steps
/// of 9,615 ppm leave 40 ppm behind at maturity. `voting_power` uses the
/// exact ratio instead.
pub const POWER_INCREASE_PERCENTAGE: Amount = BASE_PERCENTAGE / MAX_EPOCHS as Amount;

/// Largest principal a single lock may carry. Keeps `amount * MAX_EPOCHS`
/// inside the Amount range so power never saturates.
pub const MAX_LOCKED_AMOUNT: Amount = Amount::MAX / MAX_EPOCHS as Amount;

/// Voting power of `locked_amount` with `epochs_remaining` epochs left:
/// `locked_amount * epochs_remaining / MAX_EPOCHS`, truncated. Reaches zero
/// exactly at maturity and equals `locked_amount` at full term.
pub fn voting_power(locked_amount: Amount, epochs_remaining: u64) -> Amount {
    let epochs = epochs_remaining.min(MAX_EPOCHS) as Amount;
    locked_amount.saturating_mul(epochs) / MAX_EPOCHS as Amount
}

/// A single lock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Current holder.
    pub owner: Address,
    /// Principal currently locked (in wei).
    #[serde(with = "amount_string")]
    pub locked_amount: Amount,
    /// Epochs left until maturity, in `0..=MAX_EPOCHS`.
    pub epochs_remaining: u64,
    /// Epoch at which the lock was opened or produced by a merge.
    pub creation_epoch: Epoch,
}

impl Lock {
    /// Current voting power.
    pub fn power(&self) -> Amount {
        voting_power(self.locked_amount, self.epochs_remaining)
    }

    /// A lock with no epochs remaining has no power and can be unlocked.
    pub fn is_expired(&self) -> bool {
        self.epochs_remaining == 0
    }
}

/// Owns every lock, the owner index, and the holder list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRegistry {
    locks: BTreeMap<LockId, Lock>,
    next_lock_id: LockId,
    owned: HashMap<Address, BTreeSet<LockId>>,
    holders: Vec<Address>,
    total_locked: Amount,
}

impl LockRegistry {
    /// Create an empty registry. The first minted lock gets id 1.
    pub fn new() -> Self {
        Self {
            locks: BTreeMap::new(),
            next_lock_id: 1,
            owned: HashMap::new(),
            holders: Vec::new(),
            total_locked: 0,
        }
    }

    /// Open a new lock of `amount` for `epochs` epochs.
    ///
    /// Debits `amount` from `caller` through the ledger and returns the id
    /// of the new lock.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero or larger than `MAX_LOCKED_AMOUNT`.
    /// - `InvalidNumberOfEpochs` if `epochs` is outside `1..=MAX_EPOCHS`.
    /// - Any ledger error from the debit.
    pub fn lock<L: Ledger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: Amount,
        epochs: u64,
        current_epoch: Epoch,
    ) -> Result<LockId> {
        if amount == 0 {
            return Err(HorizaError::InvalidAmount(
                "lock amount must be positive".to_string(),
            ));
        }
        if amount > MAX_LOCKED_AMOUNT {
            return Err(HorizaError::InvalidAmount(format!(
                "lock amount {} exceeds the maximum of {}",
                amount, MAX_LOCKED_AMOUNT
            )));
        }
        if epochs == 0 || epochs > MAX_EPOCHS {
            return Err(HorizaError::InvalidNumberOfEpochs(epochs));
        }
        let new_total = self.checked_total_add(amount)?;

        ledger.debit(caller, amount)?;

        let lock_id = self.mint(Lock {
            owner: *caller,
            locked_amount: amount,
            epochs_remaining: epochs,
            creation_epoch: current_epoch,
        });
        self.total_locked = new_total;

        tracing::info!(
            lock_id,
            owner = %caller,
            amount,
            epochs,
            "Lock created"
        );
        Ok(lock_id)
    }

    /// Add `amount` to the principal of an active lock.
    ///
    /// The remaining term is unchanged; power grows in proportion.
    ///
    /// # Errors
    /// - `UnknownLock` / `NotLockOwner` if `caller` does not own `lock_id`.
    /// - `InvalidAmount` for a zero amount or a principal overflow.
    /// - `ExpiredLock` if the lock has no epochs remaining.
    pub fn increase<L: Ledger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        lock_id: LockId,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Err(HorizaError::InvalidAmount(
                "increase amount must be positive".to_string(),
            ));
        }
        let lock = self.owned_lock(caller, lock_id)?;
        if lock.is_expired() {
            return Err(HorizaError::ExpiredLock(lock_id));
        }
        let new_amount = lock
            .locked_amount
            .checked_add(amount)
            .filter(|a| *a <= MAX_LOCKED_AMOUNT)
            .ok_or_else(|| {
                HorizaError::InvalidAmount(format!(
                    "lock {} principal would exceed the maximum of {}",
                    lock_id, MAX_LOCKED_AMOUNT
                ))
            })?;
        let new_total = self.checked_total_add(amount)?;

        ledger.debit(caller, amount)?;

        if let Some(lock) = self.locks.get_mut(&lock_id) {
            lock.locked_amount = new_amount;
        }
        self.total_locked = new_total;

        tracing::info!(lock_id, amount, locked_amount = new_amount, "Lock increased");
        Ok(())
    }

    /// Lengthen a lock by `delta_epochs`. Returns the new remaining term.
    ///
    /// # Errors
    /// `InvalidNumberOfEpochsToExtend` if `delta_epochs` is zero or the new
    /// term would exceed `MAX_EPOCHS`. A lock already at `MAX_EPOCHS` can
    /// never be extended.
    pub fn extend(&mut self, caller: &Address, lock_id: LockId, delta_epochs: u64) -> Result<u64> {
        let lock = self.owned_lock(caller, lock_id)?;
        let remaining = lock.epochs_remaining;
        let extended = remaining
            .checked_add(delta_epochs)
            .filter(|e| delta_epochs > 0 && *e <= MAX_EPOCHS)
            .ok_or(HorizaError::InvalidNumberOfEpochsToExtend {
                lock_id,
                remaining,
                requested: delta_epochs,
            })?;

        if let Some(lock) = self.locks.get_mut(&lock_id) {
            lock.epochs_remaining = extended;
        }

        tracing::info!(lock_id, delta_epochs, epochs_remaining = extended, "Lock extended");
        Ok(extended)
    }

    /// Release matured locks back to their owner.
    ///
    /// Every listed lock must be owned by `caller` and have no epochs
    /// remaining. The combined principal is credited in one ledger movement
    /// and the locks are destroyed. Returns the amount released.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty list, `DuplicateLock` for a repeated id.
    /// - `ForbiddenToUnlock` if any lock still has epochs remaining.
    pub fn unlock<L: Ledger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        lock_ids: &[LockId],
    ) -> Result<Amount> {
        if lock_ids.is_empty() {
            return Err(HorizaError::InvalidInput("no lock ids to unlock".to_string()));
        }

        let mut seen = BTreeSet::new();
        let mut released: Amount = 0;
        for &lock_id in lock_ids {
            if !seen.insert(lock_id) {
                return Err(HorizaError::DuplicateLock(lock_id));
            }
            let lock = self.owned_lock(caller, lock_id)?;
            if !lock.is_expired() {
                return Err(HorizaError::ForbiddenToUnlock {
                    lock_id,
                    epochs_remaining: lock.epochs_remaining,
                });
            }
            released = released
                .checked_add(lock.locked_amount)
                .ok_or_else(|| HorizaError::ArithmeticOverflow("unlock total".to_string()))?;
        }

        ledger.credit(caller, released)?;

        for &lock_id in lock_ids {
            self.burn(lock_id);
        }
        self.total_locked -= released;

        tracing::info!(owner = %caller, locks = lock_ids.len(), released, "Locks unlocked");
        Ok(released)
    }

    /// Combine two locks of the same owner into a newly minted lock.
    ///
    /// The new lock carries the summed principal and the longer of the two
    /// remaining terms; both sources are destroyed. Its power is recomputed
    /// from those fields, so it can exceed the sum of the source powers.
    pub fn merge(
        &mut self,
        caller: &Address,
        first: LockId,
        second: LockId,
        current_epoch: Epoch,
    ) -> Result<LockId> {
        if first == second {
            return Err(HorizaError::DuplicateLock(first));
        }
        let a = self.owned_lock(caller, first)?;
        let b = self.owned_lock(caller, second)?;
        let locked_amount = a
            .locked_amount
            .checked_add(b.locked_amount)
            .filter(|amount| *amount <= MAX_LOCKED_AMOUNT)
            .ok_or_else(|| {
                HorizaError::InvalidAmount(format!(
                    "merged principal would exceed the maximum of {}",
                    MAX_LOCKED_AMOUNT
                ))
            })?;
        let epochs_remaining = a.epochs_remaining.max(b.epochs_remaining);

        // Mint before burning so the owner keeps its place in the holder list.
        let merged = self.mint(Lock {
            owner: *caller,
            locked_amount,
            epochs_remaining,
            creation_epoch: current_epoch,
        });
        self.burn(first);
        self.burn(second);

        tracing::info!(
            first,
            second,
            merged,
            locked_amount,
            epochs_remaining,
            "Locks merged"
        );
        Ok(merged)
    }

    /// Hand a lock to another address.
    pub fn transfer(&mut self, caller: &Address, lock_id: LockId, to: &Address) -> Result<()> {
        if to.is_zero() {
            return Err(HorizaError::InvalidInput(
                "cannot transfer a lock to the zero address".to_string(),
            ));
        }
        self.owned_lock(caller, lock_id)?;
        if caller == to {
            return Ok(());
        }

        self.remove_from_owner(caller, lock_id);
        self.add_to_owner(*to, lock_id);
        if let Some(lock) = self.locks.get_mut(&lock_id) {
            lock.owner = *to;
        }

        tracing::info!(lock_id, from = %caller, to = %to, "Lock transferred");
        Ok(())
    }

    /// Decay step: every lock with epochs left loses one.
    ///
    /// Returns the number of locks that matured in this step.
    pub fn on_epoch_advance(&mut self) -> usize {
        let mut matured = 0;
        for lock in self.locks.values_mut() {
            if lock.epochs_remaining > 0 {
                lock.epochs_remaining -= 1;
                if lock.epochs_remaining == 0 {
                    matured += 1;
                }
            }
        }
        matured
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lock_info(&self, lock_id: LockId) -> Option<&Lock> {
        self.locks.get(&lock_id)
    }

    /// Current voting power of a lock.
    pub fn power_of(&self, lock_id: LockId) -> Result<Amount> {
        self.locks
            .get(&lock_id)
            .map(Lock::power)
            .ok_or(HorizaError::UnknownLock(lock_id))
    }

    /// Power usable for new votes. Decay is already applied to the current
    /// power, so this equals `power_of`.
    pub fn available_power(&self, lock_id: LockId) -> Result<Amount> {
        self.power_of(lock_id)
    }

    /// Sum of every lock's principal.
    pub fn total_locked(&self) -> Amount {
        self.total_locked
    }

    /// Sum of every lock's current power.
    pub fn total_power(&self) -> Amount {
        self.locks.values().map(Lock::power).sum()
    }

    pub fn number_of_holders(&self) -> usize {
        self.holders.len()
    }

    /// Holder at position `index` in insertion order.
    pub fn holder_at(&self, index: usize) -> Option<Address> {
        self.holders.get(index).copied()
    }

    pub fn holders(&self) -> &[Address] {
        &self.holders
    }

    /// Ids of the locks held by `owner`, ascending.
    pub fn locks_of(&self, owner: &Address) -> Vec<LockId> {
        self.owned
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of locks held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> usize {
        self.owned.get(owner).map_or(0, BTreeSet::len)
    }

    /// Combined principal of every lock held by `owner`.
    pub fn locked_amount_of(&self, owner: &Address) -> Amount {
        self.owned_locks(owner).map(|lock| lock.locked_amount).sum()
    }

    /// Combined power of every lock held by `owner`.
    pub fn power_of_owner(&self, owner: &Address) -> Amount {
        self.owned_locks(owner).map(Lock::power).sum()
    }

    /// Number of live locks.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// The id the next minted lock will receive.
    pub fn next_lock_id(&self) -> LockId {
        self.next_lock_id
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn owned_lock(&self, caller: &Address, lock_id: LockId) -> Result<&Lock> {
        let lock = self
            .locks
            .get(&lock_id)
            .ok_or(HorizaError::UnknownLock(lock_id))?;
        if lock.owner != *caller {
            return Err(HorizaError::NotLockOwner {
                lock_id,
                caller: *caller,
            });
        }
        Ok(lock)
    }

    fn owned_locks<'a>(&'a self, owner: &Address) -> impl Iterator<Item = &'a Lock> + 'a {
        self.owned
            .get(owner)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.locks.get(id))
    }

    fn checked_total_add(&self, amount: Amount) -> Result<Amount> {
        self.total_locked
            .checked_add(amount)
            .ok_or_else(|| HorizaError::ArithmeticOverflow("total locked".to_string()))
    }

    fn mint(&mut self, lock: Lock) -> LockId {
        let lock_id = self.next_lock_id;
        self.next_lock_id += 1;
        self.add_to_owner(lock.owner, lock_id);
        self.locks.insert(lock_id, lock);
        lock_id
    }

    fn burn(&mut self, lock_id: LockId) {
        if let Some(lock) = self.locks.remove(&lock_id) {
            self.remove_from_owner(&lock.owner, lock_id);
        }
    }

    fn add_to_owner(&mut self, owner: Address, lock_id: LockId) {
        let ids = self.owned.entry(owner).or_default();
        if ids.is_empty() {
            self.holders.push(owner);
        }
        ids.insert(lock_id);
    }

    fn remove_from_owner(&mut self, owner: &Address, lock_id: LockId) {
        let now_empty = match self.owned.get_mut(owner) {
            Some(ids) => {
                ids.remove(&lock_id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.owned.remove(owner);
            self.holders.retain(|holder| holder != owner);
        }
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    const LOCK_AMOUNT: Amount = 100_000;

    fn alice() -> Address {
        Address([0xa1; 20])
    }

    fn bob() -> Address {
        Address([0xb0; 20])
    }

    fn funded_ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice(), 10_000_000).unwrap();
        ledger.mint(&bob(), 10_000_000).unwrap();
        ledger
    }

    #[test]
    fn test_power_formula_bounds() {
        assert_eq!(voting_power(LOCK_AMOUNT, MAX_EPOCHS), LOCK_AMOUNT);
        assert_eq!(voting_power(LOCK_AMOUNT, 0), 0);
        assert_eq!(voting_power(LOCK_AMOUNT, 52), LOCK_AMOUNT / 2);
    }

    #[test]
    fn test_decay_step_constant() {
        assert_eq!(POWER_INCREASE_PERCENTAGE, 9_615);
        // The rounded ppm step would not reach zero at maturity.
        assert_eq!(BASE_PERCENTAGE - POWER_INCREASE_PERCENTAGE * MAX_EPOCHS as Amount, 40);
    }

    #[test]
    fn test_lock_full_term_has_full_power() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT, MAX_EPOCHS, 0)
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(registry.power_of(id).unwrap(), LOCK_AMOUNT);
        assert_eq!(registry.lock_info(id).unwrap().epochs_remaining, MAX_EPOCHS);
        assert_eq!(registry.number_of_holders(), 1);
        assert_eq!(registry.holder_at(0), Some(alice()));
        assert_eq!(registry.balance_of(&alice()), 1);
        assert_eq!(ledger.balance_of(&alice()), 10_000_000 - LOCK_AMOUNT);
    }

    #[test]
    fn test_lock_rejects_bad_input() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();

        assert!(matches!(
            registry.lock(&mut ledger, &alice(), 0, 10, 0),
            Err(HorizaError::InvalidAmount(_))
        ));
        assert_eq!(
            registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 0, 0),
            Err(HorizaError::InvalidNumberOfEpochs(0))
        );
        assert_eq!(
            registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, MAX_EPOCHS + 1, 0),
            Err(HorizaError::InvalidNumberOfEpochs(MAX_EPOCHS + 1))
        );
        assert!(registry.is_empty());
        assert_eq!(ledger.balance_of(&alice()), 10_000_000);
    }

    #[test]
    fn test_lock_insufficient_balance_leaves_registry_untouched() {
        let mut ledger = InMemoryLedger::new();
        let mut registry = LockRegistry::new();
        let result = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 10, 0);
        assert!(matches!(result, Err(HorizaError::InsufficientBalance { .. })));
        assert!(registry.is_empty());
        assert_eq!(registry.number_of_holders(), 0);
        assert_eq!(registry.next_lock_id(), 1);
    }

    #[test]
    fn test_one_epoch_decay_then_extend_restores_power() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT, MAX_EPOCHS, 0)
            .unwrap();

        registry.on_epoch_advance();
        // Exact ratio: 100,000 * 103 / 104 = 99,038.46..., truncated. The
        // 9,615 ppm step would give 99,038.5 here.
        assert_eq!(registry.power_of(id).unwrap(), 99_038);
        assert_eq!(
            LOCK_AMOUNT * (BASE_PERCENTAGE - POWER_INCREASE_PERCENTAGE) / BASE_PERCENTAGE,
            99_038
        );
        assert_eq!(registry.available_power(id).unwrap(), 99_038);

        assert_eq!(registry.extend(&alice(), id, 1).unwrap(), MAX_EPOCHS);
        assert_eq!(registry.power_of(id).unwrap(), LOCK_AMOUNT);
    }

    #[test]
    fn test_extend_at_max_fails() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT, MAX_EPOCHS, 0)
            .unwrap();

        assert_eq!(
            registry.extend(&alice(), id, 1),
            Err(HorizaError::InvalidNumberOfEpochsToExtend {
                lock_id: id,
                remaining: MAX_EPOCHS,
                requested: 1,
            })
        );
        assert!(registry.extend(&alice(), id, 0).is_err());
        assert!(registry.extend(&alice(), id, u64::MAX).is_err());
        assert_eq!(registry.lock_info(id).unwrap().epochs_remaining, MAX_EPOCHS);
    }

    #[test]
    fn test_increase_keeps_term() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT, MAX_EPOCHS, 0)
            .unwrap();

        registry
            .increase(&mut ledger, &alice(), id, LOCK_AMOUNT)
            .unwrap();
        assert_eq!(registry.power_of(id).unwrap(), LOCK_AMOUNT * 2);
        assert_eq!(registry.total_locked(), LOCK_AMOUNT * 2);
        assert_eq!(registry.lock_info(id).unwrap().epochs_remaining, MAX_EPOCHS);
    }

    #[test]
    fn test_increase_expired_lock_fails() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 1, 0).unwrap();
        registry.on_epoch_advance();

        assert_eq!(
            registry.increase(&mut ledger, &alice(), id, 1),
            Err(HorizaError::ExpiredLock(id))
        );
    }

    #[test]
    fn test_increase_requires_owner() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 5, 0).unwrap();

        assert_eq!(
            registry.increase(&mut ledger, &bob(), id, 1),
            Err(HorizaError::NotLockOwner {
                lock_id: id,
                caller: bob(),
            })
        );
        assert_eq!(
            registry.increase(&mut ledger, &alice(), 99, 1),
            Err(HorizaError::UnknownLock(99))
        );
    }

    #[test]
    fn test_short_lock_power_and_merge() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let long = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT * 2, MAX_EPOCHS, 0)
            .unwrap();
        let short = registry
            .lock(&mut ledger, &alice(), LOCK_AMOUNT, 30, 0)
            .unwrap();

        // Exact ratio: 100,000 * 30 / 104 = 28,846.15..., truncated. The
        // 9,615 ppm step gives 100,000 * 30 * 9,615 / 1,000,000 = 28,845.
        assert_eq!(registry.power_of(short).unwrap(), 28_846);
        assert_eq!(
            LOCK_AMOUNT * 30 * POWER_INCREASE_PERCENTAGE / BASE_PERCENTAGE,
            28_845
        );
        assert_eq!(registry.number_of_holders(), 1);
        assert_eq!(registry.balance_of(&alice()), 2);

        let merged = registry.merge(&alice(), long, short, 3).unwrap();
        assert_eq!(merged, 3);
        let lock = registry.lock_info(merged).unwrap();
        assert_eq!(lock.locked_amount, LOCK_AMOUNT * 3);
        assert_eq!(lock.epochs_remaining, MAX_EPOCHS);
        assert_eq!(lock.creation_epoch, 3);
        assert_eq!(registry.power_of(merged).unwrap(), LOCK_AMOUNT * 3);

        assert!(registry.lock_info(long).is_none());
        assert!(registry.lock_info(short).is_none());
        assert_eq!(registry.balance_of(&alice()), 1);
        assert_eq!(registry.number_of_holders(), 1);
        assert_eq!(registry.holder_at(0), Some(alice()));
        assert_eq!(registry.total_locked(), LOCK_AMOUNT * 3);
    }

    #[test]
    fn test_merge_power_can_exceed_sum_of_sources() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let a = registry.lock(&mut ledger, &alice(), 104, 104, 0).unwrap();
        let b = registry.lock(&mut ledger, &alice(), 104, 1, 0).unwrap();
        let before = registry.power_of(a).unwrap() + registry.power_of(b).unwrap();

        let merged = registry.merge(&alice(), a, b, 0).unwrap();
        assert_eq!(before, 105);
        assert_eq!(registry.power_of(merged).unwrap(), 208);
    }

    #[test]
    fn test_merge_rejects_foreign_and_same_lock() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let a = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 10, 0).unwrap();
        let b = registry.lock(&mut ledger, &bob(), LOCK_AMOUNT, 10, 0).unwrap();

        assert_eq!(registry.merge(&alice(), a, a, 0), Err(HorizaError::DuplicateLock(a)));
        assert!(matches!(
            registry.merge(&alice(), a, b, 0),
            Err(HorizaError::NotLockOwner { .. })
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unlock_before_maturity_fails() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 2, 0).unwrap();

        assert_eq!(
            registry.unlock(&mut ledger, &alice(), &[id]),
            Err(HorizaError::ForbiddenToUnlock {
                lock_id: id,
                epochs_remaining: 2,
            })
        );
        registry.on_epoch_advance();
        assert!(registry.unlock(&mut ledger, &alice(), &[id]).is_err());
    }

    #[test]
    fn test_unlock_after_maturity_returns_principal() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let a = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 1, 0).unwrap();
        let b = registry.lock(&mut ledger, &alice(), 5, 1, 0).unwrap();
        assert_eq!(registry.on_epoch_advance(), 2);
        assert_eq!(registry.power_of(a).unwrap(), 0);

        let released = registry.unlock(&mut ledger, &alice(), &[a, b]).unwrap();
        assert_eq!(released, LOCK_AMOUNT + 5);
        assert_eq!(ledger.balance_of(&alice()), 10_000_000);
        assert!(registry.is_empty());
        assert_eq!(registry.number_of_holders(), 0);
        assert_eq!(registry.total_locked(), 0);
    }

    #[test]
    fn test_unlock_duplicate_ids_rejected() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 1, 0).unwrap();
        registry.on_epoch_advance();

        assert_eq!(
            registry.unlock(&mut ledger, &alice(), &[id, id]),
            Err(HorizaError::DuplicateLock(id))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_decay_stops_at_zero() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), LOCK_AMOUNT, 2, 0).unwrap();
        for _ in 0..5 {
            registry.on_epoch_advance();
        }
        assert_eq!(registry.lock_info(id).unwrap().epochs_remaining, 0);
        assert_eq!(registry.power_of(id).unwrap(), 0);
    }

    #[test]
    fn test_holder_order_is_insertion_order() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let carol = Address([0xc0; 20]);

        let a = registry.lock(&mut ledger, &alice(), 10, 10, 0).unwrap();
        registry.lock(&mut ledger, &bob(), 10, 10, 0).unwrap();
        registry.transfer(&alice(), a, &carol).unwrap();

        assert_eq!(registry.holders(), &[bob(), carol]);
        assert_eq!(registry.lock_info(a).unwrap().owner, carol);
        assert_eq!(registry.locks_of(&carol), vec![a]);
        assert_eq!(registry.balance_of(&alice()), 0);
    }

    #[test]
    fn test_transfer_to_zero_address_rejected() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let id = registry.lock(&mut ledger, &alice(), 10, 10, 0).unwrap();
        assert!(registry.transfer(&alice(), id, &Address::ZERO).is_err());
        assert!(registry.transfer(&bob(), id, &bob()).is_err());
    }

    #[test]
    fn test_power_invariant_after_every_mutation() {
        let mut ledger = funded_ledger();
        let mut registry = LockRegistry::new();
        let a = registry.lock(&mut ledger, &alice(), 7_777, 13, 0).unwrap();
        let b = registry.lock(&mut ledger, &alice(), 1_234, 77, 0).unwrap();

        let check = |registry: &LockRegistry| {
            for id in registry.locks_of(&alice()) {
                let lock = registry.lock_info(id).unwrap();
                assert_eq!(
                    registry.power_of(id).unwrap(),
                    lock.locked_amount * lock.epochs_remaining as Amount / MAX_EPOCHS as Amount
                );
            }
        };

        check(&registry);
        registry.on_epoch_advance();
        check(&registry);
        registry.increase(&mut ledger, &alice(), a, 99).unwrap();
        check(&registry);
        registry.extend(&alice(), b, 20).unwrap();
        check(&registry);
        registry.merge(&alice(), a, b, 1).unwrap();
        check(&registry);
    }
}
