// crates/horiza-economics/src/protocol.rs
//
// The protocol engine.
//
// `Protocol` owns every registry plus the ledger and is the only writer of
// either. Each state-changing operation runs through `transact`:
//
//   1. The registries are checkpointed (cloned).
//   2. The operation runs against the live state, with ledger movements
//      routed through a `LedgerJournal`.
//   3. On error the checkpoint is restored and the journal compensates its
//      movements in reverse order, so a rejected operation leaves no trace.
//
// Callers that share the engine across tasks wrap it in a single-writer
// actor; the engine itself has no interior locking.

use serde::{Deserialize, Serialize};

use horiza_core::{
    Address, Amount, Epoch, GaugeId, Hash32, HorizaError, Ledger, LockId, Result, Timestamp,
};

use crate::emission::{EmissionController, EmissionPolicy, EmissionSplit};
use crate::epoch::{EpochClock, ONE_WEEK};
use crate::gauge::GaugeRegistry;
use crate::ledger::LedgerJournal;
use crate::lock::LockRegistry;
use crate::roles::Roles;
use crate::snapshot::HolderSnapshot;

/// Parameters fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub roles: Roles,
    pub epoch_duration: u64,
    pub genesis_timestamp: Timestamp,
    pub emission: EmissionPolicy,
}

impl ProtocolConfig {
    /// Weekly epochs and the default emission policy.
    pub fn new(roles: Roles, genesis_timestamp: Timestamp) -> Self {
        Self {
            roles,
            epoch_duration: ONE_WEEK,
            genesis_timestamp,
            emission: EmissionPolicy::default(),
        }
    }
}

/// Every registry the engine mutates. Serializable for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolState {
    pub roles: Roles,
    pub clock: EpochClock,
    pub locks: LockRegistry,
    pub gauges: GaugeRegistry,
    pub emission: EmissionController,
}

impl ProtocolState {
    pub fn new(config: &ProtocolConfig) -> Result<Self> {
        Ok(Self {
            roles: config.roles,
            clock: EpochClock::new(config.epoch_duration, config.genesis_timestamp)?,
            locks: LockRegistry::new(),
            gauges: GaugeRegistry::new(),
            emission: EmissionController::new(config.emission.clone())?,
        })
    }
}

/// Clock summary for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochStatus {
    pub current_epoch: Epoch,
    pub epoch_duration: u64,
    pub last_advance: Timestamp,
    pub next_epoch_at: Timestamp,
    pub seconds_until_next: u64,
    /// Whether emission for the current epoch was already distributed.
    pub distributed: bool,
}

/// The single-writer protocol engine.
pub struct Protocol<L: Ledger> {
    state: ProtocolState,
    ledger: L,
}

impl<L: Ledger> Protocol<L> {
    /// Start a fresh protocol at epoch 0 on top of `ledger`.
    pub fn new(config: ProtocolConfig, ledger: L) -> Result<Self> {
        let state = ProtocolState::new(&config)?;
        tracing::info!(
            operator = %config.roles.operator,
            authority = %config.roles.authority,
            team = %config.roles.team,
            epoch_duration = config.epoch_duration,
            "Protocol initialized"
        );
        Ok(Self { state, ledger })
    }

    /// Resume from persisted state.
    pub fn from_parts(state: ProtocolState, ledger: L) -> Self {
        Self { state, ledger }
    }

    pub fn into_parts(self) -> (ProtocolState, L) {
        (self.state, self.ledger)
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Run `op` atomically: on error every registry and ledger change it
    /// made is undone.
    fn transact<T>(
        &mut self,
        action: &str,
        op: impl FnOnce(&mut ProtocolState, &mut LedgerJournal<'_, L>) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = self.state.clone();
        let mut journal = LedgerJournal::new(&mut self.ledger);
        match op(&mut self.state, &mut journal) {
            Ok(value) => {
                journal.commit();
                Ok(value)
            }
            Err(e) => {
                journal.rollback();
                self.state = checkpoint;
                tracing::debug!(action, error = %e, "Operation rejected");
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Escrow
    // -----------------------------------------------------------------------

    pub fn lock(&mut self, caller: &Address, amount: Amount, epochs: u64) -> Result<LockId> {
        self.transact("lock", |state, ledger| {
            let epoch = state.clock.current_epoch();
            state.locks.lock(ledger, caller, amount, epochs, epoch)
        })
    }

    pub fn increase(&mut self, caller: &Address, lock_id: LockId, amount: Amount) -> Result<()> {
        self.transact("increase", |state, ledger| {
            state.locks.increase(ledger, caller, lock_id, amount)
        })
    }

    pub fn extend(&mut self, caller: &Address, lock_id: LockId, delta_epochs: u64) -> Result<u64> {
        self.transact("extend", |state, _| {
            state.locks.extend(caller, lock_id, delta_epochs)
        })
    }

    /// Merge two locks into a new one. Ballots of both sources for the
    /// current epoch are withdrawn.
    pub fn merge(&mut self, caller: &Address, first: LockId, second: LockId) -> Result<LockId> {
        self.transact("merge", |state, _| {
            let epoch = state.clock.current_epoch();
            let merged = state.locks.merge(caller, first, second, epoch)?;
            state.gauges.withdraw_ballot(first);
            state.gauges.withdraw_ballot(second);
            Ok(merged)
        })
    }

    pub fn unlock(&mut self, caller: &Address, lock_ids: &[LockId]) -> Result<Amount> {
        self.transact("unlock", |state, ledger| {
            let released = state.locks.unlock(ledger, caller, lock_ids)?;
            for lock_id in lock_ids {
                state.gauges.withdraw_ballot(*lock_id);
            }
            Ok(released)
        })
    }

    pub fn transfer(&mut self, caller: &Address, lock_id: LockId, to: &Address) -> Result<()> {
        self.transact("transfer", |state, _| state.locks.transfer(caller, lock_id, to))
    }

    // -----------------------------------------------------------------------
    // Gauges
    // -----------------------------------------------------------------------

    pub fn create_gauge(&mut self, caller: &Address, strategy: &Address) -> Result<GaugeId> {
        self.transact("create gauge", |state, _| {
            state.roles.ensure_operator(caller, "create a gauge")?;
            let epoch = state.clock.current_epoch();
            state.gauges.create_gauge(strategy, epoch)
        })
    }

    pub fn vote(
        &mut self,
        caller: &Address,
        lock_ids: &[LockId],
        gauge_ids: &[GaugeId],
        weights: &[u64],
    ) -> Result<Amount> {
        self.transact("vote", |state, _| {
            state
                .gauges
                .vote(&state.locks, caller, lock_ids, gauge_ids, weights)
        })
    }

    // -----------------------------------------------------------------------
    // Epochs and emission
    // -----------------------------------------------------------------------

    /// Close the current epoch: advance the clock, decay every lock, and
    /// freeze the vote tallies. Returns the new epoch number.
    ///
    /// The epoch being closed must have had its emission distributed first;
    /// otherwise its frozen tally would be replaced before it was paid out.
    pub fn update_epoch(&mut self, caller: &Address, now: Timestamp) -> Result<Epoch> {
        self.transact("update epoch", |state, _| {
            state.roles.ensure_operator(caller, "advance the epoch")?;
            let closing = state.clock.current_epoch();
            let epoch = state.clock.advance(now)?;
            if closing > 0 && state.emission.ensure_distributable(closing).is_ok() {
                return Err(HorizaError::EpochNotReady(closing));
            }
            let matured = state.locks.on_epoch_advance();
            state.gauges.finalize_epoch(epoch - 1);
            tracing::info!(
                epoch,
                matured_locks = matured,
                total_power = state.locks.total_power(),
                "Epoch advanced"
            );
            Ok(epoch)
        })
    }

    /// Emit the weekly amount for the current epoch.
    ///
    /// Team share is minted to the team account. When the epoch that just
    /// closed had votes, the whole stored LP pool is allocated to gauges by
    /// that epoch's tally.
    pub fn distribute_emission(&mut self, caller: &Address, now: Timestamp) -> Result<EmissionSplit> {
        self.transact("distribute emission", |state, ledger| {
            state.roles.ensure_operator(caller, "distribute emission")?;
            let epoch = state.clock.current_epoch();
            state.emission.ensure_distributable(epoch)?;

            let closed = epoch - 1;
            let votes_cast = state.gauges.has_votes_for(closed);
            let mut split = state.emission.record_distribution(epoch, votes_cast)?;

            ledger.credit(&state.roles.team, split.team)?;

            let pool = state.emission.state().stored_emission_for_liquidity_providers;
            let period = state.clock.epoch_duration();
            let allocated = state.gauges.allocate_rewards(closed, pool, period, now)?;
            state.emission.release_to_gauges(allocated)?;
            split.allocated_to_gauges = allocated;

            tracing::info!(
                epoch,
                emission = split.emission,
                team = split.team,
                liquidity_providers = split.liquidity_providers,
                holders = split.holders,
                allocated_to_gauges = allocated,
                votes_cast,
                "Emission distributed"
            );
            Ok(split)
        })
    }

    // -----------------------------------------------------------------------
    // Holder rewards
    // -----------------------------------------------------------------------

    pub fn update_merkle_root(&mut self, caller: &Address, root: Hash32) -> Result<()> {
        self.transact("update merkle root", |state, _| {
            state.roles.ensure_authority(caller, "update the merkle root")?;
            state.emission.update_merkle_root(root);
            tracing::info!(root = %root, "Merkle root updated");
            Ok(())
        })
    }

    /// Pay a holder reward proven against the current root.
    pub fn claim(
        &mut self,
        account: &Address,
        amount: Amount,
        root: &Hash32,
        proof: &[Hash32],
    ) -> Result<()> {
        self.transact("claim", |state, ledger| {
            state.emission.verify_claim(account, amount, root, proof)?;
            ledger.credit(account, amount)?;
            state.emission.settle_claim(account, amount)?;
            tracing::info!(account = %account, amount, "Holder reward claimed");
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current_epoch(&self) -> Epoch {
        self.state.clock.current_epoch()
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.state.locks
    }

    pub fn gauges(&self) -> &GaugeRegistry {
        &self.state.gauges
    }

    pub fn emission(&self) -> &EmissionController {
        &self.state.emission
    }

    pub fn roles(&self) -> &Roles {
        &self.state.roles
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn power_of(&self, lock_id: LockId) -> Result<Amount> {
        self.state.locks.power_of(lock_id)
    }

    pub fn epoch_status(&self, now: Timestamp) -> EpochStatus {
        let clock = &self.state.clock;
        EpochStatus {
            current_epoch: clock.current_epoch(),
            epoch_duration: clock.epoch_duration(),
            last_advance: clock.last_advance(),
            next_epoch_at: clock.next_epoch_at(),
            seconds_until_next: clock.seconds_until_next(now),
            distributed: clock.current_epoch() > 0
                && self.state.emission.state().last_distributed_epoch == clock.current_epoch(),
        }
    }

    /// Holder list and pool size for the off-chain tree builder.
    pub fn snapshot(&self) -> HolderSnapshot {
        HolderSnapshot::capture(
            &self.state.locks,
            self.current_epoch(),
            self.state.emission.holder_pool(),
            self.state.emission.distributor().current_root(),
        )
    }

    /// Whether the next `update_epoch` call would succeed on timing alone.
    pub fn epoch_due(&self, now: Timestamp) -> bool {
        self.state.clock.is_elapsed(now)
    }

    /// Whether emission for the current epoch is still owed.
    pub fn distribution_due(&self) -> bool {
        self.state
            .emission
            .ensure_distributable(self.current_epoch())
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::INITIAL_WEEKLY_EMISSION;
    use crate::ledger::InMemoryLedger;
    use crate::lock::{voting_power, MAX_EPOCHS};
    use crate::token::WEI_PER_HZ;
    use horiza_core::{claim_leaf, hash_sorted_pair, HorizaError};

    const GENESIS: Timestamp = 1_700_000_000;
    const HZ: Amount = WEI_PER_HZ;

    fn operator() -> Address {
        Address([0x01; 20])
    }

    fn authority() -> Address {
        Address([0x02; 20])
    }

    fn team() -> Address {
        Address([0x03; 20])
    }

    fn alice() -> Address {
        Address([0xa1; 20])
    }

    fn bob() -> Address {
        Address([0xb0; 20])
    }

    fn protocol() -> Protocol<InMemoryLedger> {
        let roles = Roles {
            operator: operator(),
            authority: authority(),
            team: team(),
        };
        let ledger =
            InMemoryLedger::with_balances([(alice(), 1_000_000 * HZ), (bob(), 1_000_000 * HZ)])
                .unwrap();
        Protocol::new(ProtocolConfig::new(roles, GENESIS), ledger).unwrap()
    }

    fn week(n: u64) -> Timestamp {
        GENESIS + n * ONE_WEEK
    }

    #[test]
    fn test_first_distribution_without_votes() {
        let mut p = protocol();
        p.update_epoch(&operator(), week(1)).unwrap();
        let split = p.distribute_emission(&operator(), week(1)).unwrap();

        assert_eq!(split.emission, INITIAL_WEEKLY_EMISSION);
        assert_eq!(p.balance_of(&team()), INITIAL_WEEKLY_EMISSION * 2 / 100);
        assert_eq!(
            p.emission().state().stored_emission_for_liquidity_providers,
            INITIAL_WEEKLY_EMISSION * 98 / 100
        );
        assert_eq!(p.emission().holder_pool(), 0);
        assert_eq!(split.allocated_to_gauges, 0);
    }

    #[test]
    fn test_voted_epoch_allocates_stored_pool_to_gauges() {
        let mut p = protocol();
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        p.update_epoch(&operator(), week(1)).unwrap();
        p.distribute_emission(&operator(), week(1)).unwrap();

        let lock = p.lock(&alice(), 100_000 * HZ, MAX_EPOCHS).unwrap();
        p.vote(&alice(), &[lock], &[gauge], &[100]).unwrap();
        p.update_epoch(&operator(), week(2)).unwrap();
        let split = p.distribute_emission(&operator(), week(2)).unwrap();

        let second = INITIAL_WEEKLY_EMISSION * 99 / 100;
        assert_eq!(split.emission, second);
        assert_eq!(split.holders, second / 100);
        assert_eq!(split.liquidity_providers, second * 97 / 100);
        assert_eq!(p.emission().holder_pool(), second / 100);
        assert_eq!(
            p.emission().state().stored_emission_for_liquidity_providers,
            0
        );
        assert_eq!(
            split.allocated_to_gauges,
            INITIAL_WEEKLY_EMISSION * 98 / 100 + second * 97 / 100
        );
        assert!(p.gauges().gauge(gauge).unwrap().reward_rate > 0);
    }

    #[test]
    fn test_distribution_gating() {
        let mut p = protocol();
        assert_eq!(
            p.distribute_emission(&operator(), GENESIS),
            Err(HorizaError::EpochNotReady(0))
        );
        p.update_epoch(&operator(), week(1)).unwrap();
        assert!(p.distribution_due());
        p.distribute_emission(&operator(), week(1)).unwrap();
        assert_eq!(
            p.distribute_emission(&operator(), week(1)),
            Err(HorizaError::AlreadyDistributed(1))
        );
        assert!(!p.distribution_due());
        assert!(p.epoch_status(week(1)).distributed);
    }

    #[test]
    fn test_privileged_operations_require_roles() {
        let mut p = protocol();
        assert!(matches!(
            p.update_epoch(&alice(), week(1)),
            Err(HorizaError::Unauthorized { .. })
        ));
        assert!(matches!(
            p.create_gauge(&alice(), &Address([0x51; 20])),
            Err(HorizaError::Unauthorized { .. })
        ));
        assert!(matches!(
            p.update_merkle_root(&operator(), Hash32([1; 32])),
            Err(HorizaError::Unauthorized { .. })
        ));
        assert_eq!(p.current_epoch(), 0);
    }

    #[test]
    fn test_epoch_advance_decays_and_clears_votes() {
        let mut p = protocol();
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        let lock = p.lock(&alice(), 100_000, MAX_EPOCHS).unwrap();
        p.vote(&alice(), &[lock], &[gauge], &[1]).unwrap();
        assert_eq!(p.gauges().tally_of(gauge), 100_000);

        p.update_epoch(&operator(), week(1)).unwrap();
        assert_eq!(p.power_of(lock).unwrap(), 99_038);
        assert_eq!(p.gauges().tally_of(gauge), 0);
        assert_eq!(p.gauges().finalized().unwrap().total, 100_000);

        assert!(matches!(
            p.update_epoch(&operator(), week(1) + 1),
            Err(HorizaError::EpochNotElapsed { .. })
        ));
    }

    #[test]
    fn test_advance_waits_for_pending_distribution() {
        let mut p = protocol();
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        let lock = p.lock(&alice(), 100_000 * HZ, MAX_EPOCHS).unwrap();
        p.vote(&alice(), &[lock], &[gauge], &[1]).unwrap();
        p.update_epoch(&operator(), week(1)).unwrap();

        assert_eq!(
            p.update_epoch(&operator(), week(2)),
            Err(HorizaError::EpochNotReady(1))
        );
        assert_eq!(p.current_epoch(), 1);
        assert_eq!(p.power_of(lock).unwrap(), voting_power(100_000 * HZ, MAX_EPOCHS - 1));
        assert!(p.gauges().has_votes_for(0));

        let split = p.distribute_emission(&operator(), week(2)).unwrap();
        assert_eq!(split.epoch, 1);
        assert_eq!(split.holders, INITIAL_WEEKLY_EMISSION / 100);

        assert_eq!(p.update_epoch(&operator(), week(2)).unwrap(), 2);
        let split = p.distribute_emission(&operator(), week(2)).unwrap();
        assert_eq!(split.epoch, 2);
        assert_eq!(p.emission().state().last_distributed_epoch, 2);
    }

    #[test]
    fn test_merge_withdraws_source_ballots() {
        let mut p = protocol();
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        let a = p.lock(&alice(), 1_000, MAX_EPOCHS).unwrap();
        let b = p.lock(&alice(), 2_000, MAX_EPOCHS).unwrap();
        p.vote(&alice(), &[a, b], &[gauge], &[1]).unwrap();

        let merged = p.merge(&alice(), a, b).unwrap();
        assert_eq!(merged, 3);
        assert_eq!(p.gauges().tally_of(gauge), 0);
        p.vote(&alice(), &[merged], &[gauge], &[1]).unwrap();
        assert_eq!(p.gauges().tally_of(gauge), 3_000);
    }

    #[test]
    fn test_failed_operation_leaves_no_trace() {
        let mut p = protocol();
        let before = p.balance_of(&alice());
        let poor = Address([0xee; 20]);

        assert!(p.lock(&poor, 10, 10).is_err());
        assert!(p.lock(&alice(), 10, 0).is_err());
        assert_eq!(p.locks().next_lock_id(), 1);
        assert_eq!(p.locks().number_of_holders(), 0);
        assert_eq!(p.balance_of(&alice()), before);
    }

    #[test]
    fn test_claim_pays_holder_once() {
        let mut p = protocol();
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        let lock = p.lock(&alice(), 1_000 * HZ, MAX_EPOCHS).unwrap();
        p.vote(&alice(), &[lock], &[gauge], &[1]).unwrap();
        p.update_epoch(&operator(), week(1)).unwrap();
        p.distribute_emission(&operator(), week(1)).unwrap();
        let pool = p.emission().holder_pool();
        assert!(pool > 0);

        let alice_share = pool / 2;
        let bob_share = pool / 4;
        let alice_leaf = claim_leaf(&alice(), alice_share);
        let bob_leaf = claim_leaf(&bob(), bob_share);
        let root = hash_sorted_pair(&alice_leaf, &bob_leaf);
        p.update_merkle_root(&authority(), root).unwrap();

        let before = p.balance_of(&alice());
        p.claim(&alice(), alice_share, &root, &[bob_leaf]).unwrap();
        assert_eq!(p.balance_of(&alice()), before + alice_share);
        assert_eq!(p.emission().holder_pool(), pool - alice_share);
        assert_eq!(
            p.claim(&alice(), alice_share, &root, &[bob_leaf]),
            Err(HorizaError::AlreadyClaimed(alice()))
        );
        assert_eq!(
            p.claim(&bob(), bob_share + 1, &root, &[alice_leaf]),
            Err(HorizaError::InvalidProof)
        );
        assert_eq!(
            p.claim(&bob(), bob_share, &Hash32([9; 32]), &[alice_leaf]),
            Err(HorizaError::StaleRoot)
        );
        p.claim(&bob(), bob_share, &root, &[alice_leaf]).unwrap();
    }

    #[test]
    fn test_unlock_after_maturity() {
        let mut p = protocol();
        let lock = p.lock(&alice(), 500, 1).unwrap();
        assert!(matches!(
            p.unlock(&alice(), &[lock]),
            Err(HorizaError::ForbiddenToUnlock { .. })
        ));
        p.update_epoch(&operator(), week(1)).unwrap();
        let before = p.balance_of(&alice());
        assert_eq!(p.unlock(&alice(), &[lock]).unwrap(), 500);
        assert_eq!(p.balance_of(&alice()), before + 500);
        assert_eq!(p.locks().number_of_holders(), 0);
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut p = protocol();
        p.lock(&alice(), 123 * HZ, 40).unwrap();
        let json = serde_json::to_string(p.state()).unwrap();
        let back: ProtocolState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.locks.total_locked(), 123 * HZ);
        assert_eq!(back.locks.holder_at(0), Some(alice()));
    }
}
