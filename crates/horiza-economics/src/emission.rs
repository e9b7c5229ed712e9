// crates/horiza-economics/src/emission.rs
//
// Weekly emission schedule, emission split, and the holder reward
// distributor.
//
// Once per epoch the operator distributes the weekly emission:
//   - Team receives TEAM_BPS (2%) of the emission.
//   - Holders receive HOLDER_BPS (1%), but only when the closed epoch had
//     gauge votes. The share accrues to the holder pool, which pays out
//     through Merkle claims.
//   - Liquidity providers receive the remainder (98% or 97%), which is
//     stored until it is allocated to gauges by the closed epoch's tally.
//
// The weekly amount decays by EMISSION_DECAY_BPS (1%) after every
// distribution, so distribution n emits initial * 0.99^n.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{claim_leaf, verify_proof, Address, Amount, Epoch, Hash32, HorizaError, Result};

use crate::token::{mul_div, WEI_PER_HZ};

/// Basis-point denominator (100% = 10,000 bps).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Weekly emission of the first distribution: 2,600,000 HZ.
pub const INITIAL_WEEKLY_EMISSION: Amount = 2_600_000 * WEI_PER_HZ;

/// Weekly emission shrinks by 1% after each distribution.
pub const DEFAULT_EMISSION_DECAY_BPS: u32 = 100;

/// Team share of each emission (2%).
pub const DEFAULT_TEAM_BPS: u32 = 200;

/// Holder share of each emission when votes were cast (1%).
pub const DEFAULT_HOLDER_BPS: u32 = 100;

/// Emission parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionPolicy {
    #[serde(with = "amount_string")]
    pub initial_weekly_emission: Amount,
    pub emission_decay_bps: u32,
    pub team_bps: u32,
    pub holder_bps: u32,
}

impl Default for EmissionPolicy {
    fn default() -> Self {
        Self {
            initial_weekly_emission: INITIAL_WEEKLY_EMISSION,
            emission_decay_bps: DEFAULT_EMISSION_DECAY_BPS,
            team_bps: DEFAULT_TEAM_BPS,
            holder_bps: DEFAULT_HOLDER_BPS,
        }
    }
}

impl EmissionPolicy {
    /// # Errors
    /// `InvalidInput` if a share exceeds 100% or team plus holder shares do.
    pub fn validate(&self) -> Result<()> {
        if self.emission_decay_bps > BPS_DENOMINATOR {
            return Err(HorizaError::InvalidInput(format!(
                "emission decay of {} bps exceeds {}",
                self.emission_decay_bps, BPS_DENOMINATOR
            )));
        }
        if self.team_bps.saturating_add(self.holder_bps) > BPS_DENOMINATOR {
            return Err(HorizaError::InvalidInput(format!(
                "team ({} bps) and holder ({} bps) shares exceed {}",
                self.team_bps, self.holder_bps, BPS_DENOMINATOR
            )));
        }
        Ok(())
    }

    /// Split one emission. The LP share takes the rounding remainder so the
    /// three parts always sum to `emission`.
    pub fn split(&self, epoch: Epoch, emission: Amount, votes_cast: bool) -> Result<EmissionSplit> {
        let team = bps_of(emission, self.team_bps)?;
        let holders = if votes_cast {
            bps_of(emission, self.holder_bps)?
        } else {
            0
        };
        Ok(EmissionSplit {
            epoch,
            emission,
            team,
            liquidity_providers: emission - team - holders,
            holders,
            allocated_to_gauges: 0,
        })
    }

    /// Weekly emission after one decay step.
    pub fn decayed(&self, weekly_emission: Amount) -> Result<Amount> {
        bps_of(weekly_emission, BPS_DENOMINATOR - self.emission_decay_bps)
    }
}

fn bps_of(amount: Amount, bps: u32) -> Result<Amount> {
    mul_div(
        amount,
        bps as Amount,
        BPS_DENOMINATOR as Amount,
        "basis point share",
    )
}

/// Outcome of one emission distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSplit {
    pub epoch: Epoch,
    #[serde(with = "amount_string")]
    pub emission: Amount,
    #[serde(with = "amount_string")]
    pub team: Amount,
    #[serde(with = "amount_string")]
    pub liquidity_providers: Amount,
    #[serde(with = "amount_string")]
    pub holders: Amount,
    /// Part of the stored LP pool handed to gauges in this distribution.
    #[serde(with = "amount_string")]
    pub allocated_to_gauges: Amount,
}

/// Running emission accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionState {
    /// Amount the next distribution will emit.
    #[serde(with = "amount_string")]
    pub weekly_emission: Amount,
    #[serde(with = "amount_string")]
    pub emission_for_previous_epoch: Amount,
    /// LP share waiting for a voted epoch to be allocated to gauges.
    #[serde(with = "amount_string")]
    pub stored_emission_for_liquidity_providers: Amount,
    /// Holder pool still available to Merkle claims.
    #[serde(with = "amount_string")]
    pub cumulative_emission_for_holders: Amount,
    /// Epoch of the most recent distribution (0 before the first one).
    pub last_distributed_epoch: Epoch,
    #[serde(with = "amount_string")]
    pub total_emitted: Amount,
    #[serde(with = "amount_string")]
    pub total_claimed: Amount,
}

/// Merkle root and claim registry for holder rewards.
///
/// Each account can claim once per root. Publishing a new root resets the
/// claimed set, since the new tree carries each account's updated share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleDistributor {
    root: Option<Hash32>,
    claimed: HashSet<Address>,
    root_updates: u64,
}

impl MerkleDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_root(&self) -> Option<Hash32> {
        self.root
    }

    /// How many roots have been published.
    pub fn root_updates(&self) -> u64 {
        self.root_updates
    }

    pub fn is_claimed(&self, account: &Address) -> bool {
        self.claimed.contains(account)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    pub fn update_root(&mut self, root: Hash32) {
        self.root = Some(root);
        self.claimed.clear();
        self.root_updates += 1;
    }

    /// Check a claim against the current root without recording it.
    pub fn verify(
        &self,
        account: &Address,
        amount: Amount,
        root: &Hash32,
        proof: &[Hash32],
    ) -> Result<()> {
        match self.root {
            Some(current) if current == *root => {}
            _ => return Err(HorizaError::StaleRoot),
        }
        if self.is_claimed(account) {
            return Err(HorizaError::AlreadyClaimed(*account));
        }
        let leaf = claim_leaf(account, amount);
        if !verify_proof(proof, root, leaf) {
            return Err(HorizaError::InvalidProof);
        }
        Ok(())
    }

    fn mark_claimed(&mut self, account: &Address) {
        self.claimed.insert(*account);
    }
}

/// Emission schedule plus holder distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionController {
    policy: EmissionPolicy,
    state: EmissionState,
    distributor: MerkleDistributor,
}

impl EmissionController {
    pub fn new(policy: EmissionPolicy) -> Result<Self> {
        policy.validate()?;
        let state = EmissionState {
            weekly_emission: policy.initial_weekly_emission,
            emission_for_previous_epoch: 0,
            stored_emission_for_liquidity_providers: 0,
            cumulative_emission_for_holders: 0,
            last_distributed_epoch: 0,
            total_emitted: 0,
            total_claimed: 0,
        };
        Ok(Self {
            policy,
            state,
            distributor: MerkleDistributor::new(),
        })
    }

    pub fn policy(&self) -> &EmissionPolicy {
        &self.policy
    }

    pub fn state(&self) -> &EmissionState {
        &self.state
    }

    pub fn distributor(&self) -> &MerkleDistributor {
        &self.distributor
    }

    /// Holder pool still available to claims.
    pub fn holder_pool(&self) -> Amount {
        self.state.cumulative_emission_for_holders
    }

    /// # Errors
    /// - `EpochNotReady` at genesis (no epoch has closed yet).
    /// - `AlreadyDistributed` if `current_epoch` was already distributed.
    pub fn ensure_distributable(&self, current_epoch: Epoch) -> Result<()> {
        if current_epoch == 0 {
            return Err(HorizaError::EpochNotReady(current_epoch));
        }
        if self.state.last_distributed_epoch >= current_epoch {
            return Err(HorizaError::AlreadyDistributed(current_epoch));
        }
        Ok(())
    }

    /// Emit the weekly amount for `current_epoch` and book its split.
    ///
    /// The LP and holder shares are added to their pools here; the team
    /// share is returned for the caller to mint.
    pub fn record_distribution(
        &mut self,
        current_epoch: Epoch,
        votes_cast: bool,
    ) -> Result<EmissionSplit> {
        self.ensure_distributable(current_epoch)?;

        let emission = self.state.weekly_emission;
        let split = self.policy.split(current_epoch, emission, votes_cast)?;

        let overflow = || HorizaError::ArithmeticOverflow("emission accounts".to_string());
        let stored = self
            .state
            .stored_emission_for_liquidity_providers
            .checked_add(split.liquidity_providers)
            .ok_or_else(overflow)?;
        let holders = self
            .state
            .cumulative_emission_for_holders
            .checked_add(split.holders)
            .ok_or_else(overflow)?;
        let total_emitted = self
            .state
            .total_emitted
            .checked_add(emission)
            .ok_or_else(overflow)?;
        let next_weekly = self.policy.decayed(emission)?;

        self.state.stored_emission_for_liquidity_providers = stored;
        self.state.cumulative_emission_for_holders = holders;
        self.state.total_emitted = total_emitted;
        self.state.emission_for_previous_epoch = emission;
        self.state.weekly_emission = next_weekly;
        self.state.last_distributed_epoch = current_epoch;

        Ok(split)
    }

    /// Move `amount` out of the stored LP pool (it now streams from gauges).
    pub fn release_to_gauges(&mut self, amount: Amount) -> Result<()> {
        self.state.stored_emission_for_liquidity_providers = self
            .state
            .stored_emission_for_liquidity_providers
            .checked_sub(amount)
            .ok_or_else(|| {
                HorizaError::ArithmeticOverflow("liquidity provider pool underflow".to_string())
            })?;
        Ok(())
    }

    pub fn update_merkle_root(&mut self, root: Hash32) {
        self.distributor.update_root(root);
    }

    /// Validate a holder claim: root, double claim, proof, then pool size.
    pub fn verify_claim(
        &self,
        account: &Address,
        amount: Amount,
        root: &Hash32,
        proof: &[Hash32],
    ) -> Result<()> {
        if amount == 0 {
            return Err(HorizaError::InvalidAmount(
                "claim amount must be positive".to_string(),
            ));
        }
        self.distributor.verify(account, amount, root, proof)?;
        let available = self.state.cumulative_emission_for_holders;
        if amount > available {
            return Err(HorizaError::ClaimExceedsPool {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Book a verified claim: mark the account and shrink the pool.
    pub fn settle_claim(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let available = self.state.cumulative_emission_for_holders;
        let remaining = available
            .checked_sub(amount)
            .ok_or(HorizaError::ClaimExceedsPool {
                requested: amount,
                available,
            })?;
        self.state.cumulative_emission_for_holders = remaining;
        self.state.total_claimed = self.state.total_claimed.saturating_add(amount);
        self.distributor.mark_claimed(account);
        Ok(())
    }
}
