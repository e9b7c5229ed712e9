// crates/horiza-economics/src/gauge.rs
//
// Strategy gauges and vote tallies.
//
// Each gauge represents one liquidity strategy. During an epoch, lock owners
// split the power of their locks across gauges; the running per-gauge sums
// are the live tallies. When the epoch closes the tallies are frozen into a
// `FinalizedTally` and cleared, and the next emission distribution divides
// the liquidity-provider pool across gauges in proportion to that tally.
//
// A lock holds at most one ballot per epoch. Voting again with the same lock
// withdraws its earlier allocations before applying the new ones.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Epoch, GaugeId, HorizaError, LockId, Result, Timestamp};

use crate::lock::LockRegistry;
use crate::token::mul_div;

/// Reward stream for one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    pub id: GaugeId,
    pub strategy: Address,
    /// Rewards per second for the current period.
    #[serde(with = "amount_string")]
    pub reward_rate: Amount,
    /// Total rewards assigned for the current period.
    #[serde(with = "amount_string")]
    pub reward_for_period: Amount,
    /// End of the current reward period.
    pub period_finish: Timestamp,
    /// Lifetime rewards assigned to this gauge.
    #[serde(with = "amount_string")]
    pub total_rewards: Amount,
    pub created_epoch: Epoch,
}

/// One lock's vote for the current epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub lock_id: LockId,
    pub voter: Address,
    /// Power of the lock when the ballot was cast.
    pub power: Amount,
    /// Power assigned to each gauge.
    pub allocations: Vec<(GaugeId, Amount)>,
}

/// Tallies of a closed epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTally {
    pub epoch: Epoch,
    pub tallies: BTreeMap<GaugeId, Amount>,
    pub total: Amount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaugeRegistry {
    gauges: Vec<Gauge>,
    by_strategy: HashMap<Address, GaugeId>,
    ballots: BTreeMap<LockId, Ballot>,
    tallies: BTreeMap<GaugeId, Amount>,
    finalized: Option<FinalizedTally>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gauge for `strategy`. Ids are sequential from 0.
    pub fn create_gauge(&mut self, strategy: &Address, current_epoch: Epoch) -> Result<GaugeId> {
        if strategy.is_zero() {
            return Err(HorizaError::InvalidInput(
                "gauge strategy cannot be the zero address".to_string(),
            ));
        }
        if self.by_strategy.contains_key(strategy) {
            return Err(HorizaError::GaugeAlreadyExists(*strategy));
        }

        let id = self.gauges.len() as GaugeId;
        self.gauges.push(Gauge {
            id,
            strategy: *strategy,
            reward_rate: 0,
            reward_for_period: 0,
            period_finish: 0,
            total_rewards: 0,
            created_epoch: current_epoch,
        });
        self.by_strategy.insert(*strategy, id);

        tracing::info!(gauge_id = id, strategy = %strategy, "Gauge created");
        Ok(id)
    }

    /// Cast (or recast) a ballot for each lock in `lock_ids`.
    ///
    /// Each lock splits its full current power across `gauge_ids` in
    /// proportion to `weights`: gauge `i` receives
    /// `power * weights[i] / sum(weights)`, truncated. Returns the total
    /// power cast. A matured lock still records a ballot, with zero weight.
    ///
    /// Nothing is applied unless every lock and gauge validates.
    pub fn vote(
        &mut self,
        locks: &LockRegistry,
        caller: &Address,
        lock_ids: &[LockId],
        gauge_ids: &[GaugeId],
        weights: &[u64],
    ) -> Result<Amount> {
        if lock_ids.is_empty() {
            return Err(HorizaError::InvalidVote("no locks given".to_string()));
        }
        if gauge_ids.is_empty() {
            return Err(HorizaError::InvalidVote("no gauges given".to_string()));
        }
        if gauge_ids.len() != weights.len() {
            return Err(HorizaError::InvalidVote(format!(
                "{} gauges but {} weights",
                gauge_ids.len(),
                weights.len()
            )));
        }

        let mut distinct_gauges = BTreeSet::new();
        for &gauge_id in gauge_ids {
            if self.gauge(gauge_id).is_none() {
                return Err(HorizaError::UnknownGauge(gauge_id));
            }
            if !distinct_gauges.insert(gauge_id) {
                return Err(HorizaError::InvalidVote(format!(
                    "gauge {} listed more than once",
                    gauge_id
                )));
            }
        }

        let weight_sum: Amount = weights.iter().map(|w| *w as Amount).sum();
        if weight_sum == 0 {
            return Err(HorizaError::InvalidVote("weights sum to zero".to_string()));
        }

        let mut seen_locks = BTreeSet::new();
        let mut ballots = Vec::with_capacity(lock_ids.len());
        for &lock_id in lock_ids {
            if !seen_locks.insert(lock_id) {
                return Err(HorizaError::DuplicateLock(lock_id));
            }
            let lock = locks
                .lock_info(lock_id)
                .ok_or(HorizaError::UnknownLock(lock_id))?;
            if lock.owner != *caller {
                return Err(HorizaError::NotLockOwner {
                    lock_id,
                    caller: *caller,
                });
            }

            let power = lock.power();
            let allocations = gauge_ids
                .iter()
                .zip(weights)
                .map(|(&gauge_id, &weight)| {
                    mul_div(power, weight as Amount, weight_sum, "vote allocation")
                        .map(|share| (gauge_id, share))
                })
                .collect::<Result<Vec<_>>>()?;

            ballots.push(Ballot {
                lock_id,
                voter: *caller,
                power,
                allocations,
            });
        }

        let mut cast: Amount = 0;
        for ballot in ballots {
            self.withdraw_ballot(ballot.lock_id);
            for &(gauge_id, share) in ballot.allocations.iter().filter(|(_, share)| *share > 0) {
                *self.tallies.entry(gauge_id).or_insert(0) += share;
            }
            cast += ballot.power;
            tracing::debug!(
                lock_id = ballot.lock_id,
                voter = %ballot.voter,
                power = ballot.power,
                "Ballot cast"
            );
            self.ballots.insert(ballot.lock_id, ballot);
        }
        Ok(cast)
    }

    /// Remove a lock's ballot from the live tallies, if it has one.
    pub fn withdraw_ballot(&mut self, lock_id: LockId) -> Option<Ballot> {
        let ballot = self.ballots.remove(&lock_id)?;
        for &(gauge_id, share) in &ballot.allocations {
            if let Some(tally) = self.tallies.get_mut(&gauge_id) {
                *tally = tally.saturating_sub(share);
                if *tally == 0 {
                    self.tallies.remove(&gauge_id);
                }
            }
        }
        Some(ballot)
    }

    /// Freeze the live tallies as the result of `closed_epoch` and start an
    /// empty voting round.
    pub fn finalize_epoch(&mut self, closed_epoch: Epoch) -> &FinalizedTally {
        let tallies = std::mem::take(&mut self.tallies);
        self.ballots.clear();
        let total = tallies.values().sum();
        tracing::info!(
            epoch = closed_epoch,
            gauges_voted = tallies.len(),
            total,
            "Epoch tallies finalized"
        );
        self.finalized.insert(FinalizedTally {
            epoch: closed_epoch,
            tallies,
            total,
        })
    }

    /// Whether `closed_epoch` finished with a non-zero tally.
    pub fn has_votes_for(&self, closed_epoch: Epoch) -> bool {
        self.finalized
            .as_ref()
            .is_some_and(|t| t.epoch == closed_epoch && t.total > 0)
    }

    /// Split `pool` across gauges by the finalized tally of `closed_epoch`
    /// and start a new reward period of `period` seconds at `now`.
    ///
    /// Gauges without votes (or every gauge, when `closed_epoch` had none)
    /// get a zero rate. Returns the amount actually assigned, which can be
    /// slightly below `pool` because shares truncate.
    pub fn allocate_rewards(
        &mut self,
        closed_epoch: Epoch,
        pool: Amount,
        period: u64,
        now: Timestamp,
    ) -> Result<Amount> {
        let rewards = match &self.finalized {
            Some(tally) if tally.epoch == closed_epoch && tally.total > 0 => self
                .gauges
                .iter()
                .map(|gauge| {
                    let votes = tally.tallies.get(&gauge.id).copied().unwrap_or(0);
                    mul_div(pool, votes, tally.total, "gauge reward")
                })
                .collect::<Result<Vec<_>>>()?,
            _ => vec![0; self.gauges.len()],
        };

        let mut allocated: Amount = 0;
        for (gauge, reward) in self.gauges.iter_mut().zip(rewards) {
            gauge.reward_for_period = reward;
            gauge.reward_rate = reward / period.max(1) as Amount;
            if reward > 0 {
                gauge.period_finish = now.saturating_add(period);
                gauge.total_rewards = gauge.total_rewards.saturating_add(reward);
                allocated += reward;
                tracing::debug!(
                    gauge_id = gauge.id,
                    reward,
                    reward_rate = gauge.reward_rate,
                    "Gauge reward period started"
                );
            }
        }
        Ok(allocated)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn gauge(&self, id: GaugeId) -> Option<&Gauge> {
        usize::try_from(id).ok().and_then(|i| self.gauges.get(i))
    }

    pub fn gauge_by_strategy(&self, strategy: &Address) -> Option<&Gauge> {
        self.by_strategy.get(strategy).and_then(|id| self.gauge(*id))
    }

    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Live tally of a gauge in the current epoch.
    pub fn tally_of(&self, id: GaugeId) -> Amount {
        self.tallies.get(&id).copied().unwrap_or(0)
    }

    pub fn tallies(&self) -> &BTreeMap<GaugeId, Amount> {
        &self.tallies
    }

    pub fn total_tally(&self) -> Amount {
        self.tallies.values().sum()
    }

    pub fn ballot(&self, lock_id: LockId) -> Option<&Ballot> {
        self.ballots.get(&lock_id)
    }

    pub fn finalized(&self) -> Option<&FinalizedTally> {
        self.finalized.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::lock::MAX_EPOCHS;

    fn alice() -> Address {
        Address([0xa1; 20])
    }

    fn strategy(n: u8) -> Address {
        Address([n; 20])
    }

    /// Registry with one 100,000 full-term lock (id 1) owned by alice.
    fn setup() -> (LockRegistry, GaugeRegistry) {
        let mut ledger = InMemoryLedger::with_balances([(alice(), 1_000_000)]).unwrap();
        let mut locks = LockRegistry::new();
        locks
            .lock(&mut ledger, &alice(), 100_000, MAX_EPOCHS, 0)
            .unwrap();
        let mut gauges = GaugeRegistry::new();
        gauges.create_gauge(&strategy(0x51), 0).unwrap();
        gauges.create_gauge(&strategy(0x52), 0).unwrap();
        (locks, gauges)
    }

    #[test]
    fn test_create_gauge_sequential_ids() {
        let (_, gauges) = setup();
        assert_eq!(gauges.len(), 2);
        assert_eq!(gauges.gauge(1).unwrap().strategy, strategy(0x52));
        assert_eq!(gauges.gauge_by_strategy(&strategy(0x51)).unwrap().id, 0);
    }

    #[test]
    fn test_duplicate_strategy_rejected() {
        let (_, mut gauges) = setup();
        assert_eq!(
            gauges.create_gauge(&strategy(0x51), 1),
            Err(HorizaError::GaugeAlreadyExists(strategy(0x51)))
        );
    }

    #[test]
    fn test_vote_splits_power_by_weight() {
        let (locks, mut gauges) = setup();
        let cast = gauges.vote(&locks, &alice(), &[1], &[0, 1], &[1, 3]).unwrap();
        assert_eq!(cast, 100_000);
        assert_eq!(gauges.tally_of(0), 25_000);
        assert_eq!(gauges.tally_of(1), 75_000);
    }

    #[test]
    fn test_revote_replaces_previous_ballot() {
        let (locks, mut gauges) = setup();
        gauges.vote(&locks, &alice(), &[1], &[0], &[100]).unwrap();
        gauges.vote(&locks, &alice(), &[1], &[1], &[100]).unwrap();
        assert_eq!(gauges.tally_of(0), 0);
        assert_eq!(gauges.tally_of(1), 100_000);
        assert_eq!(gauges.total_tally(), 100_000);
    }

    #[test]
    fn test_vote_validation() {
        let (locks, mut gauges) = setup();
        let bob = Address([0xb0; 20]);

        assert!(matches!(
            gauges.vote(&locks, &alice(), &[1], &[0, 1], &[1]),
            Err(HorizaError::InvalidVote(_))
        ));
        assert!(matches!(
            gauges.vote(&locks, &alice(), &[1], &[0], &[0]),
            Err(HorizaError::InvalidVote(_))
        ));
        assert!(matches!(
            gauges.vote(&locks, &alice(), &[1], &[0, 0], &[1, 1]),
            Err(HorizaError::InvalidVote(_))
        ));
        assert_eq!(
            gauges.vote(&locks, &alice(), &[1], &[7], &[1]),
            Err(HorizaError::UnknownGauge(7))
        );
        assert_eq!(
            gauges.vote(&locks, &alice(), &[1, 1], &[0], &[1]),
            Err(HorizaError::DuplicateLock(1))
        );
        assert!(matches!(
            gauges.vote(&locks, &bob, &[1], &[0], &[1]),
            Err(HorizaError::NotLockOwner { .. })
        ));
        assert!(gauges.tallies().is_empty());
    }

    #[test]
    fn test_matured_lock_votes_with_zero_weight() {
        let mut ledger = InMemoryLedger::with_balances([(alice(), 1_000)]).unwrap();
        let mut locks = LockRegistry::new();
        let id = locks.lock(&mut ledger, &alice(), 1_000, 1, 0).unwrap();
        locks.on_epoch_advance();
        assert_eq!(locks.power_of(id).unwrap(), 0);

        let mut gauges = GaugeRegistry::new();
        gauges.create_gauge(&strategy(0x51), 1).unwrap();
        assert_eq!(gauges.vote(&locks, &alice(), &[id], &[0], &[1]).unwrap(), 0);

        let ballot = gauges.ballot(id).unwrap();
        assert_eq!(ballot.power, 0);
        assert_eq!(ballot.allocations, vec![(0, 0)]);
        assert_eq!(gauges.total_tally(), 0);
        assert!(gauges.tallies().is_empty());

        gauges.finalize_epoch(1);
        assert!(!gauges.has_votes_for(1));
    }

    #[test]
    fn test_finalize_clears_round() {
        let (locks, mut gauges) = setup();
        gauges.vote(&locks, &alice(), &[1], &[0], &[1]).unwrap();
        let frozen = gauges.finalize_epoch(0).clone();

        assert_eq!(frozen.total, 100_000);
        assert_eq!(frozen.tallies.get(&0), Some(&100_000));
        assert!(gauges.tallies().is_empty());
        assert!(gauges.ballot(1).is_none());
        assert!(gauges.has_votes_for(0));
        assert!(!gauges.has_votes_for(1));
    }

    #[test]
    fn test_allocate_rewards_proportional() {
        let (locks, mut gauges) = setup();
        gauges.vote(&locks, &alice(), &[1], &[0, 1], &[1, 1]).unwrap();
        gauges.finalize_epoch(0);

        let allocated = gauges.allocate_rewards(0, 1_000, 100, 5_000).unwrap();
        assert_eq!(allocated, 1_000);
        let g0 = gauges.gauge(0).unwrap();
        assert_eq!(g0.reward_for_period, 500);
        assert_eq!(g0.reward_rate, 5);
        assert_eq!(g0.period_finish, 5_100);
    }

    #[test]
    fn test_allocate_without_votes_zeroes_rates() {
        let (_, mut gauges) = setup();
        gauges.finalize_epoch(0);
        assert_eq!(gauges.allocate_rewards(0, 1_000, 100, 5_000).unwrap(), 0);
        assert!(gauges.gauges().iter().all(|g| g.reward_rate == 0));
    }
}
