// crates/horiza-rpc/src/handlers/escrow.rs
//
// Voting-escrow handlers: Lock, Increase, Extend, Merge, Unlock, Transfer,
// LockInfo, LocksOf, Holders, Snapshot.
//
// `caller` is the account the operation acts for. The transport carries no
// signatures; the daemon trusts whoever can reach its RPC port.

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, HorizaError, LockId};
use horiza_economics::{HolderSnapshot, Lock};

use crate::engine::{Engine, EngineHandle};
use crate::handlers::rpc_error;

/// A lock together with its current power.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockView {
    pub lock_id: LockId,
    #[serde(flatten)]
    pub lock: Lock,
    #[serde(with = "amount_string")]
    pub power: Amount,
}

fn lock_view(engine: &Engine, lock_id: LockId) -> Result<LockView, HorizaError> {
    let lock = engine
        .locks()
        .lock_info(lock_id)
        .ok_or(HorizaError::UnknownLock(lock_id))?;
    Ok(LockView {
        lock_id,
        power: lock.power(),
        lock: lock.clone(),
    })
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRequest {
    pub caller: Address,
    #[serde(with = "amount_string")]
    pub amount: Amount,
    pub epochs: u64,
}

/// Handle a Lock request. Returns the new lock.
pub async fn handle_lock(engine: &EngineHandle, request: LockRequest) -> Result<LockView, String> {
    engine
        .execute(move |e| {
            let lock_id = e.lock(&request.caller, request.amount, request.epochs)?;
            lock_view(e, lock_id)
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Increase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncreaseRequest {
    pub caller: Address,
    pub lock_id: LockId,
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

pub async fn handle_increase(
    engine: &EngineHandle,
    request: IncreaseRequest,
) -> Result<LockView, String> {
    engine
        .execute(move |e| {
            e.increase(&request.caller, request.lock_id, request.amount)?;
            lock_view(e, request.lock_id)
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Extend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendRequest {
    pub caller: Address,
    pub lock_id: LockId,
    /// Epochs to add to the remaining term.
    pub epochs: u64,
}

pub async fn handle_extend(
    engine: &EngineHandle,
    request: ExtendRequest,
) -> Result<LockView, String> {
    engine
        .execute(move |e| {
            e.extend(&request.caller, request.lock_id, request.epochs)?;
            lock_view(e, request.lock_id)
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub caller: Address,
    pub first: LockId,
    pub second: LockId,
}

/// Handle a Merge request. Returns the newly minted lock.
pub async fn handle_merge(engine: &EngineHandle, request: MergeRequest) -> Result<LockView, String> {
    engine
        .execute(move |e| {
            let merged = e.merge(&request.caller, request.first, request.second)?;
            lock_view(e, merged)
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Unlock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub caller: Address,
    pub lock_ids: Vec<LockId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub lock_ids: Vec<LockId>,
    #[serde(with = "amount_string")]
    pub released: Amount,
    #[serde(with = "amount_string")]
    pub balance: Amount,
}

pub async fn handle_unlock(
    engine: &EngineHandle,
    request: UnlockRequest,
) -> Result<UnlockResponse, String> {
    engine
        .execute(move |e| {
            let released = e.unlock(&request.caller, &request.lock_ids)?;
            Ok(UnlockResponse {
                balance: e.balance_of(&request.caller),
                lock_ids: request.lock_ids,
                released,
            })
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub caller: Address,
    pub lock_id: LockId,
    pub to: Address,
}

pub async fn handle_transfer(
    engine: &EngineHandle,
    request: TransferRequest,
) -> Result<LockView, String> {
    engine
        .execute(move |e| {
            e.transfer(&request.caller, request.lock_id, &request.to)?;
            lock_view(e, request.lock_id)
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// LockInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfoRequest {
    pub lock_id: LockId,
}

pub async fn handle_lock_info(
    engine: &EngineHandle,
    request: LockInfoRequest,
) -> Result<LockView, String> {
    engine
        .execute(move |e| lock_view(e, request.lock_id))
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// LocksOf
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocksOfRequest {
    pub owner: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocksOfResponse {
    pub owner: Address,
    pub locks: Vec<LockView>,
    #[serde(with = "amount_string")]
    pub locked_amount: Amount,
    #[serde(with = "amount_string")]
    pub power: Amount,
}

pub async fn handle_locks_of(
    engine: &EngineHandle,
    request: LocksOfRequest,
) -> Result<LocksOfResponse, String> {
    engine
        .execute(move |e| {
            let owner = request.owner;
            let locks = e
                .locks()
                .locks_of(&owner)
                .into_iter()
                .map(|lock_id| lock_view(e, lock_id))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LocksOfResponse {
                owner,
                locks,
                locked_amount: e.locks().locked_amount_of(&owner),
                power: e.locks().power_of_owner(&owner),
            })
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Holders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldersRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldersResponse {
    pub number_of_holders: usize,
    pub holders: Vec<Address>,
    #[serde(with = "amount_string")]
    pub total_locked: Amount,
    #[serde(with = "amount_string")]
    pub total_power: Amount,
}

pub async fn handle_holders(
    engine: &EngineHandle,
    _request: HoldersRequest,
) -> Result<HoldersResponse, String> {
    engine
        .call(|e| {
            let locks = e.locks();
            HoldersResponse {
                number_of_holders: locks.number_of_holders(),
                holders: locks.holders().to_vec(),
                total_locked: locks.total_locked(),
                total_power: locks.total_power(),
            }
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotRequest {}

/// Holder snapshot for the off-chain tree builder.
pub async fn handle_snapshot(
    engine: &EngineHandle,
    _request: SnapshotRequest,
) -> Result<HolderSnapshot, String> {
    engine.call(|e| e.snapshot()).await.map_err(rpc_error)
}
