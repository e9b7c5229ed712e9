// crates/horiza-merkle/src/distribution.rs
//
// A built reward distribution: the root to publish plus every account's
// amount and proof. Serialized to JSON and handed to claimants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{claim_leaf, verify_proof, Address, Amount, Epoch, Hash32, HorizaError, Result};
use horiza_economics::HolderSnapshot;

use crate::shares::{compute_shares, Share};
use crate::tree::ClaimTree;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    #[serde(with = "amount_string")]
    pub amount: Amount,
    pub proof: Vec<Hash32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub epoch: Epoch,
    pub root: Hash32,
    /// Holder pool the shares were computed from.
    #[serde(with = "amount_string")]
    pub holder_pool: Amount,
    /// Sum of every claim; at most `holder_pool`.
    #[serde(with = "amount_string")]
    pub total: Amount,
    pub claims: BTreeMap<Address, ClaimEntry>,
}

impl Distribution {
    /// Compute shares from a holder snapshot and build their tree.
    pub fn from_snapshot(snapshot: &HolderSnapshot) -> Result<Self> {
        let shares = compute_shares(snapshot)?;
        Self::from_shares(snapshot.epoch, snapshot.holder_pool, &shares)
    }

    pub fn from_shares(epoch: Epoch, holder_pool: Amount, shares: &[Share]) -> Result<Self> {
        let tree = ClaimTree::build(shares)?;
        let root = tree.root();

        let mut claims = BTreeMap::new();
        let mut total: Amount = 0;
        for share in shares {
            let proof = tree.proof(&share.account).ok_or_else(|| {
                HorizaError::InvalidInput(format!("no proof for {}", share.account))
            })?;
            total = total
                .checked_add(share.amount)
                .ok_or_else(|| HorizaError::ArithmeticOverflow("distribution total".to_string()))?;
            claims.insert(
                share.account,
                ClaimEntry {
                    amount: share.amount,
                    proof,
                },
            );
        }

        tracing::info!(
            epoch,
            root = %root,
            accounts = claims.len(),
            total,
            "Claim tree built"
        );
        Ok(Self {
            epoch,
            root,
            holder_pool,
            total,
            claims,
        })
    }

    pub fn claim_of(&self, account: &Address) -> Option<&ClaimEntry> {
        self.claims.get(account)
    }

    /// Check that every entry proves against `root`. Returns the accounts
    /// whose proof fails.
    pub fn verify(&self) -> Vec<Address> {
        self.claims
            .iter()
            .filter(|(account, entry)| {
                !verify_proof(&entry.proof, &self.root, claim_leaf(account, entry.amount))
            })
            .map(|(account, _)| *account)
            .collect()
    }
}
