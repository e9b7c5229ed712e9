// crates/horiza-rpc/src/handlers/distributor.rs
//
// Holder reward handlers: UpdateMerkleRoot, Claim.

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Hash32};

use crate::engine::EngineHandle;
use crate::handlers::rpc_error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRootRequest {
    /// Must be the Merkle root authority.
    pub caller: Address,
    pub root: Hash32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRootResponse {
    pub root: Hash32,
    pub root_updates: u64,
}

pub async fn handle_update_root(
    engine: &EngineHandle,
    request: UpdateRootRequest,
) -> Result<UpdateRootResponse, String> {
    engine
        .execute(move |e| {
            e.update_merkle_root(&request.caller, request.root)?;
            Ok(UpdateRootResponse {
                root: request.root,
                root_updates: e.emission().distributor().root_updates(),
            })
        })
        .await
        .map_err(rpc_error)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub account: Address,
    #[serde(with = "amount_string")]
    pub amount: Amount,
    /// Root the proof was built against; must be the current root.
    pub root: Hash32,
    pub proof: Vec<Hash32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub account: Address,
    #[serde(with = "amount_string")]
    pub amount: Amount,
    #[serde(with = "amount_string")]
    pub balance: Amount,
    /// Holder pool left after this claim.
    #[serde(with = "amount_string")]
    pub holder_pool: Amount,
}

pub async fn handle_claim(
    engine: &EngineHandle,
    request: ClaimRequest,
) -> Result<ClaimResponse, String> {
    engine
        .execute(move |e| {
            e.claim(&request.account, request.amount, &request.root, &request.proof)?;
            Ok(ClaimResponse {
                account: request.account,
                amount: request.amount,
                balance: e.balance_of(&request.account),
                holder_pool: e.emission().holder_pool(),
            })
        })
        .await
        .map_err(rpc_error)
}
