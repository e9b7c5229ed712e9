// crates/horiza-rpc/src/handlers/epoch.rs
//
// Epoch handlers: GetEpochStatus, UpdateEpoch.

use serde::{Deserialize, Serialize};

use horiza_core::Address;
use horiza_economics::EpochStatus;

use crate::engine::{EngineHandle, TimeSource};
use crate::handlers::rpc_error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochStatusRequest {}

pub async fn handle_epoch_status(
    engine: &EngineHandle,
    clock: &TimeSource,
    _request: EpochStatusRequest,
) -> Result<EpochStatus, String> {
    let now = clock();
    engine
        .call(move |e| e.epoch_status(now))
        .await
        .map_err(rpc_error)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEpochRequest {
    /// Must be the operator.
    pub caller: Address,
}

/// Advance the epoch at the server's current time.
pub async fn handle_update_epoch(
    engine: &EngineHandle,
    clock: &TimeSource,
    request: UpdateEpochRequest,
) -> Result<EpochStatus, String> {
    let now = clock();
    engine
        .execute(move |e| {
            e.update_epoch(&request.caller, now)?;
            Ok(e.epoch_status(now))
        })
        .await
        .map_err(rpc_error)
}
