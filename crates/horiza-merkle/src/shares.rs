// crates/horiza-merkle/src/shares.rs
//
// Holder share computation.
//
// Every holder receives the holder pool in proportion to its locked
// principal (not its power):
//
//   share = locked_amount * holder_pool / total_locked
//
// Shares truncate, so their sum never exceeds the pool.

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Result};
use horiza_economics::{mul_div, HolderSnapshot};

/// One account's claimable amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub account: Address,
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

/// Shares of every holder in the snapshot, in holder order.
///
/// Holders whose share truncates to zero are left out; a zero leaf could
/// never be claimed.
pub fn compute_shares(snapshot: &HolderSnapshot) -> Result<Vec<Share>> {
    if snapshot.total_locked == 0 || snapshot.holder_pool == 0 {
        return Ok(Vec::new());
    }

    let mut shares = Vec::with_capacity(snapshot.holders.len());
    for holder in &snapshot.holders {
        let amount = mul_div(
            holder.locked_amount,
            snapshot.holder_pool,
            snapshot.total_locked,
            "holder share",
        )?;
        if amount > 0 {
            shares.push(Share {
                account: holder.address,
                amount,
            });
        }
    }

    tracing::debug!(
        epoch = snapshot.epoch,
        holders = snapshot.holders.len(),
        shares = shares.len(),
        "Holder shares computed"
    );
    Ok(shares)
}
