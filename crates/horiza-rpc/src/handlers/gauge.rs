// crates/horiza-rpc/src/handlers/gauge.rs
//
// Gauge handlers: CreateGauge, Vote, ListGauges, Tallies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount, Epoch, GaugeId, LockId};
use horiza_economics::Gauge;

use crate::engine::EngineHandle;
use crate::handlers::rpc_error;

// ---------------------------------------------------------------------------
// CreateGauge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGaugeRequest {
    /// Must be the operator.
    pub caller: Address,
    pub strategy: Address,
}

pub async fn handle_create_gauge(
    engine: &EngineHandle,
    request: CreateGaugeRequest,
) -> Result<Gauge, String> {
    engine
        .execute(move |e| {
            let id = e.create_gauge(&request.caller, &request.strategy)?;
            e.gauges()
                .gauge(id)
                .cloned()
                .ok_or(horiza_core::HorizaError::UnknownGauge(id))
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub caller: Address,
    pub lock_ids: Vec<LockId>,
    pub gauge_ids: Vec<GaugeId>,
    /// Relative weights, one per gauge.
    pub weights: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub epoch: Epoch,
    /// Total power cast by the listed locks.
    #[serde(with = "amount_string")]
    pub power_cast: Amount,
}

pub async fn handle_vote(engine: &EngineHandle, request: VoteRequest) -> Result<VoteResponse, String> {
    engine
        .execute(move |e| {
            let power_cast = e.vote(
                &request.caller,
                &request.lock_ids,
                &request.gauge_ids,
                &request.weights,
            )?;
            Ok(VoteResponse {
                epoch: e.current_epoch(),
                power_cast,
            })
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// ListGauges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListGaugesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGaugesResponse {
    pub gauges: Vec<Gauge>,
}

pub async fn handle_list_gauges(
    engine: &EngineHandle,
    _request: ListGaugesRequest,
) -> Result<ListGaugesResponse, String> {
    engine
        .call(|e| ListGaugesResponse {
            gauges: e.gauges().gauges().to_vec(),
        })
        .await
        .map_err(rpc_error)
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TalliesRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub gauge_id: GaugeId,
    #[serde(with = "amount_string")]
    pub votes: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedView {
    pub epoch: Epoch,
    #[serde(with = "amount_string")]
    pub total: Amount,
    pub tallies: Vec<TallyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalliesResponse {
    pub epoch: Epoch,
    /// Running tallies of the current epoch.
    pub live: Vec<TallyEntry>,
    #[serde(with = "amount_string")]
    pub live_total: Amount,
    /// Frozen tallies of the last closed epoch.
    pub finalized: Option<FinalizedView>,
}

fn entries(tallies: &BTreeMap<GaugeId, Amount>) -> Vec<TallyEntry> {
    tallies
        .iter()
        .map(|(gauge_id, votes)| TallyEntry {
            gauge_id: *gauge_id,
            votes: *votes,
        })
        .collect()
}

pub async fn handle_tallies(
    engine: &EngineHandle,
    _request: TalliesRequest,
) -> Result<TalliesResponse, String> {
    engine
        .call(|e| {
            let gauges = e.gauges();
            TalliesResponse {
                epoch: e.current_epoch(),
                live: entries(gauges.tallies()),
                live_total: gauges.total_tally(),
                finalized: gauges.finalized().map(|f| FinalizedView {
                    epoch: f.epoch,
                    total: f.total,
                    tallies: entries(&f.tallies),
                }),
            }
        })
        .await
        .map_err(rpc_error)
}
