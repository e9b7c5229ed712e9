// crates/horiza-rpc/src/handlers/emission.rs
//
// Emission handlers: Distribute, GetEmissionStatus.

use serde::{Deserialize, Serialize};

use horiza_core::{Address, Epoch, Hash32};
use horiza_economics::{EmissionPolicy, EmissionSplit, EmissionState};

use crate::engine::{EngineHandle, TimeSource};
use crate::handlers::rpc_error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributeRequest {
    /// Must be the operator.
    pub caller: Address,
}

pub async fn handle_distribute(
    engine: &EngineHandle,
    clock: &TimeSource,
    request: DistributeRequest,
) -> Result<EmissionSplit, String> {
    let now = clock();
    engine
        .execute(move |e| e.distribute_emission(&request.caller, now))
        .await
        .map_err(rpc_error)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmissionStatusRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionStatusResponse {
    pub epoch: Epoch,
    pub policy: EmissionPolicy,
    pub state: EmissionState,
    pub merkle_root: Option<Hash32>,
    pub root_updates: u64,
    pub claimed_accounts: usize,
}

pub async fn handle_emission_status(
    engine: &EngineHandle,
    _request: EmissionStatusRequest,
) -> Result<EmissionStatusResponse, String> {
    engine
        .call(|e| {
            let emission = e.emission();
            let distributor = emission.distributor();
            EmissionStatusResponse {
                epoch: e.current_epoch(),
                policy: emission.policy().clone(),
                state: emission.state().clone(),
                merkle_root: distributor.current_root(),
                root_updates: distributor.root_updates(),
                claimed_accounts: distributor.claimed_count(),
            }
        })
        .await
        .map_err(rpc_error)
}
