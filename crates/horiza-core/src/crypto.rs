// crates/horiza-core/src/crypto.rs
//
// keccak256 hashing and Merkle proof verification for holder reward claims.
//
// The scheme matches the common EVM distributor layout:
//   leaf  = keccak256(address (20 bytes) || amount (32-byte big-endian))
//   node  = keccak256(min(a, b) || max(a, b))
// Sorting each pair makes proofs position-independent, so a proof is just
// the list of sibling hashes from leaf to root.

use sha3::{Digest, Keccak256};

use crate::types::{Address, Amount, Hash32};

/// Compute the keccak256 hash of the given bytes.
pub fn keccak256(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash32(output)
}

/// Encode an amount as a 32-byte big-endian word (uint256).
pub fn amount_word(amount: Amount) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&amount.to_be_bytes());
    word
}

/// Compute the Merkle leaf committing `amount` to `account`.
pub fn claim_leaf(account: &Address, amount: Amount) -> Hash32 {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(account.as_bytes());
    packed[20..].copy_from_slice(&amount_word(amount));
    keccak256(&packed)
}

/// Hash two nodes in ascending byte order.
pub fn hash_sorted_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(lo.as_bytes());
    packed[32..].copy_from_slice(hi.as_bytes());
    keccak256(&packed)
}

/// Fold a proof onto a leaf, returning the implied root.
pub fn process_proof(proof: &[Hash32], leaf: Hash32) -> Hash32 {
    proof
        .iter()
        .fold(leaf, |computed, sibling| hash_sorted_pair(&computed, sibling))
}

/// Returns `true` if `proof` links `leaf` to `root`.
pub fn verify_proof(proof: &[Hash32], root: &Hash32, leaf: Hash32) -> bool {
    process_proof(proof, leaf) == *root
}
