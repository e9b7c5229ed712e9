// crates/horiza-rpc/src/handlers/node.rs
//
// Node health handler.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use horiza_core::Epoch;

use crate::engine::EngineHandle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHealthRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// "healthy" while the engine answers, "unhealthy" otherwise.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub engine_ok: bool,
    pub current_epoch: Option<Epoch>,
    pub lock_count: Option<usize>,
}

/// Handle a GetHealth request. Never fails; a stopped engine is reported
/// as unhealthy.
pub async fn handle_get_health(
    engine: &EngineHandle,
    start_time: Option<Instant>,
    _request: GetHealthRequest,
) -> Result<GetHealthResponse, String> {
    let probe = engine
        .call(|e| (e.current_epoch(), e.locks().len()))
        .await
        .ok();

    Ok(GetHealthResponse {
        status: if probe.is_some() { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.map_or(0, |t| t.elapsed().as_secs()),
        engine_ok: probe.is_some(),
        current_epoch: probe.map(|(epoch, _)| epoch),
        lock_count: probe.map(|(_, count)| count),
    })
}
