// crates/horiza-merkle/src/tree.rs
//
// Sorted-pair keccak256 Merkle tree.
//
// Layer 0 holds the claim leaves sorted ascending. Each higher layer pairs
// adjacent nodes with `hash_sorted_pair`; a trailing unpaired node is
// carried up unchanged. Proofs are the sibling hashes from leaf to root,
// skipping levels where the node had no sibling.

use std::collections::HashMap;

use horiza_core::{claim_leaf, hash_sorted_pair, Address, Amount, Hash32, HorizaError, Result};

use crate::shares::Share;

#[derive(Debug, Clone)]
pub struct ClaimTree {
    layers: Vec<Vec<Hash32>>,
    /// Leaf hash and amount per account.
    claims: HashMap<Address, (Hash32, Amount)>,
}

impl ClaimTree {
    /// Build a tree over `shares`.
    ///
    /// # Errors
    /// `InvalidInput` if `shares` is empty or lists an account twice.
    pub fn build(shares: &[Share]) -> Result<Self> {
        if shares.is_empty() {
            return Err(HorizaError::InvalidInput(
                "cannot build a claim tree without shares".to_string(),
            ));
        }

        let mut claims = HashMap::with_capacity(shares.len());
        for share in shares {
            let leaf = claim_leaf(&share.account, share.amount);
            if claims.insert(share.account, (leaf, share.amount)).is_some() {
                return Err(HorizaError::InvalidInput(format!(
                    "account {} appears more than once",
                    share.account
                )));
            }
        }

        let mut leaves: Vec<Hash32> = claims.values().map(|(leaf, _)| *leaf).collect();
        leaves.sort();

        let mut layers = vec![leaves];
        loop {
            let level = &layers[layers.len() - 1];
            if level.len() <= 1 {
                break;
            }
            let next: Vec<Hash32> = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_sorted_pair(left, right),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }

        Ok(Self { layers, claims })
    }

    pub fn root(&self) -> Hash32 {
        // `build` guarantees at least one leaf, so the top layer has one node.
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Hash32::ZERO)
    }

    /// Sorted leaf hashes.
    pub fn leaves(&self) -> &[Hash32] {
        &self.layers[0]
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Amount committed for `account`.
    pub fn amount_of(&self, account: &Address) -> Option<Amount> {
        self.claims.get(account).map(|(_, amount)| *amount)
    }

    /// Proof for the leaf at `index` in the sorted leaf layer.
    pub fn proof_at(&self, mut index: usize) -> Option<Vec<Hash32>> {
        if index >= self.leaves().len() {
            return None;
        }
        let mut proof = Vec::with_capacity(self.depth());
        for level in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = level.get(index ^ 1) {
                proof.push(*sibling);
            }
            index /= 2;
        }
        Some(proof)
    }

    /// Proof for `account`'s claim, if it has one.
    pub fn proof(&self, account: &Address) -> Option<Vec<Hash32>> {
        let (leaf, _) = self.claims.get(account)?;
        let index = self.leaves().binary_search(leaf).ok()?;
        self.proof_at(index)
    }
}
