// crates/horiza-daemon/tests/integration_main_flow.rs
//
// End-to-end tests for the Horiza Protocol.
//
// Walks the weekly cycle: lock, vote, advance, distribute, snapshot, build
// the claim tree off-chain, publish the root, claim. Runs once against the
// engine directly and once through the engine actor and RPC dispatch.
//
// These tests use the public APIs of the library crates (horiza-economics,
// horiza-merkle, horiza-rpc) since the daemon is a binary crate with no
// lib.rs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;

use horiza_core::{Address, Amount, HorizaError, Timestamp};
use horiza_economics::{
    voting_power, HolderSnapshot, InMemoryLedger, Protocol, ProtocolConfig, ProtocolState, Roles,
    INITIAL_WEEKLY_EMISSION, MAX_EPOCHS, ONE_WEEK, WEI_PER_HZ,
};
use horiza_merkle::Distribution;
use horiza_rpc::{EngineHandle, HorizaRpcServer, JsonRpcRequest, RpcConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GENESIS: Timestamp = 1_700_000_000;
const HZ: Amount = WEI_PER_HZ;

fn operator() -> Address {
    Address([0x01; 20])
}

fn authority() -> Address {
    Address([0x02; 20])
}

fn team() -> Address {
    Address([0x03; 20])
}

fn alice() -> Address {
    Address([0xa1; 20])
}

fn bob() -> Address {
    Address([0xb0; 20])
}

fn week(n: u64) -> Timestamp {
    GENESIS + n * ONE_WEEK
}

fn protocol() -> Protocol<InMemoryLedger> {
    let roles = Roles {
        operator: operator(),
        authority: authority(),
        team: team(),
    };
    let ledger =
        InMemoryLedger::with_balances([(alice(), 1_000_000 * HZ), (bob(), 1_000_000 * HZ)])
            .unwrap();
    Protocol::new(ProtocolConfig::new(roles, GENESIS), ledger).unwrap()
}

// ---------------------------------------------------------------------------
// Engine-level flow
// ---------------------------------------------------------------------------

#[test]
fn test_weekly_cycle_end_to_end() {
    let mut p = protocol();
    let g0 = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
    let g1 = p.create_gauge(&operator(), &Address([0x52; 20])).unwrap();

    let a = p.lock(&alice(), 100_000 * HZ, MAX_EPOCHS).unwrap();
    let b = p.lock(&bob(), 50_000 * HZ, 30).unwrap();
    assert_eq!(p.power_of(a).unwrap(), 100_000 * HZ);
    assert_eq!(p.power_of(b).unwrap(), 50_000 * HZ * 30 / 104);
    assert_eq!(p.locks().number_of_holders(), 2);

    p.vote(&alice(), &[a], &[g0, g1], &[3, 1]).unwrap();
    p.vote(&bob(), &[b], &[g1], &[1]).unwrap();

    // Epoch 1: votes were cast in epoch 0, so holders get their share and
    // the whole LP pool goes to gauges.
    p.update_epoch(&operator(), week(1)).unwrap();
    let split = p.distribute_emission(&operator(), week(1)).unwrap();
    assert_eq!(split.emission, INITIAL_WEEKLY_EMISSION);
    assert_eq!(split.team, INITIAL_WEEKLY_EMISSION * 2 / 100);
    assert_eq!(split.holders, INITIAL_WEEKLY_EMISSION / 100);
    assert_eq!(
        p.emission().state().stored_emission_for_liquidity_providers,
        0
    );
    assert_eq!(p.balance_of(&team()), split.team);

    let gauge0 = p.gauges().gauge(g0).unwrap().total_rewards;
    let gauge1 = p.gauges().gauge(g1).unwrap().total_rewards;
    assert_eq!(gauge0 + gauge1, split.allocated_to_gauges);
    assert!(gauge0 > gauge1);
    assert!(split.liquidity_providers - split.allocated_to_gauges < 10);

    // Powers decayed by one epoch.
    assert_eq!(p.power_of(a).unwrap(), voting_power(100_000 * HZ, 103));
    assert_eq!(p.power_of(b).unwrap(), voting_power(50_000 * HZ, 29));

    // Off-chain: snapshot -> shares -> tree -> root.
    let snapshot = p.snapshot();
    assert_eq!(snapshot.holder_pool, split.holders);
    let distribution = Distribution::from_snapshot(&snapshot).unwrap();
    assert!(distribution.verify().is_empty());
    assert!(distribution.total <= split.holders);
    assert_eq!(
        distribution.claim_of(&alice()).unwrap().amount,
        split.holders * 2 / 3
    );

    p.update_merkle_root(&authority(), distribution.root).unwrap();

    for account in [alice(), bob()] {
        let entry = distribution.claim_of(&account).unwrap();
        let before = p.balance_of(&account);
        p.claim(&account, entry.amount, &distribution.root, &entry.proof)
            .unwrap();
        assert_eq!(p.balance_of(&account), before + entry.amount);
    }
    assert_eq!(
        p.emission().holder_pool(),
        split.holders - distribution.total
    );

    let entry = distribution.claim_of(&alice()).unwrap();
    assert_eq!(
        p.claim(&alice(), entry.amount, &distribution.root, &entry.proof),
        Err(HorizaError::AlreadyClaimed(alice()))
    );

    // Epoch 2 without new votes: holders get nothing, LP emission is stored.
    p.update_epoch(&operator(), week(2)).unwrap();
    let split = p.distribute_emission(&operator(), week(2)).unwrap();
    assert_eq!(split.emission, INITIAL_WEEKLY_EMISSION * 99 / 100);
    assert_eq!(split.holders, 0);
    assert_eq!(split.allocated_to_gauges, 0);
    assert_eq!(
        p.emission().state().stored_emission_for_liquidity_providers,
        split.liquidity_providers
    );
}

#[test]
fn test_restart_from_persisted_state_matches_uninterrupted_run() {
    let mut uninterrupted = protocol();
    let mut restarted = protocol();

    for p in [&mut uninterrupted, &mut restarted] {
        let gauge = p.create_gauge(&operator(), &Address([0x51; 20])).unwrap();
        let lock = p.lock(&alice(), 10_000 * HZ, 52).unwrap();
        p.vote(&alice(), &[lock], &[gauge], &[1]).unwrap();
        p.update_epoch(&operator(), week(1)).unwrap();
    }

    // Persist and restore through JSON, as the daemon does.
    let (state, ledger) = restarted.into_parts();
    let state_json = serde_json::to_string(&state).unwrap();
    let ledger_json = serde_json::to_string(&ledger).unwrap();
    let state: ProtocolState = serde_json::from_str(&state_json).unwrap();
    let ledger: InMemoryLedger = serde_json::from_str(&ledger_json).unwrap();
    let mut restarted = Protocol::from_parts(state, ledger);

    let a = uninterrupted.distribute_emission(&operator(), week(1)).unwrap();
    let b = restarted.distribute_emission(&operator(), week(1)).unwrap();
    assert_eq!(a, b);
    assert_eq!(uninterrupted.snapshot(), restarted.snapshot());
    assert_eq!(uninterrupted.balance_of(&team()), restarted.balance_of(&team()));
}

#[test]
fn test_merged_and_unlocked_locks_leave_the_snapshot() {
    let mut p = protocol();
    let first = p.lock(&alice(), 1_000 * HZ, 2).unwrap();
    let second = p.lock(&alice(), 3_000 * HZ, 10).unwrap();
    let short = p.lock(&bob(), 500 * HZ, 1).unwrap();

    let merged = p.merge(&alice(), first, second).unwrap();
    assert_eq!(p.locks().lock_info(merged).unwrap().locked_amount, 4_000 * HZ);
    assert_eq!(p.locks().lock_info(merged).unwrap().epochs_remaining, 10);
    assert!(p.locks().lock_info(first).is_none());

    p.update_epoch(&operator(), week(1)).unwrap();
    p.unlock(&bob(), &[short]).unwrap();
    assert_eq!(p.balance_of(&bob()), 1_000_000 * HZ);

    let snapshot: HolderSnapshot = p.snapshot();
    assert_eq!(snapshot.holders.len(), 1);
    assert_eq!(snapshot.holders[0].address, alice());
    assert_eq!(snapshot.total_locked, 4_000 * HZ);
}

// ---------------------------------------------------------------------------
// Actor + RPC flow
// ---------------------------------------------------------------------------

struct Node {
    server: HorizaRpcServer,
    now: Arc<AtomicU64>,
}

impl Node {
    fn start() -> Self {
        let (handle, _task) = EngineHandle::spawn(protocol());
        let now = Arc::new(AtomicU64::new(GENESIS));
        let source = now.clone();
        let server = HorizaRpcServer::new(RpcConfig::default(), handle)
            .with_clock(Arc::new(move || source.load(Ordering::SeqCst)));
        Self { server, now }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let response = self
            .server
            .handle(JsonRpcRequest {
                method: method.to_string(),
                params,
            })
            .await;
        assert!(
            response.success,
            "{} failed: {:?}",
            method,
            response.error
        );
        response.result.unwrap_or_default()
    }
}

#[tokio::test]
async fn test_weekly_cycle_over_rpc() {
    let node = Node::start();

    let gauge = node
        .call(
            "gauge/create",
            json!({ "caller": operator(), "strategy": Address([0x51; 20]) }),
        )
        .await;
    let gauge_id = gauge["id"].as_u64().unwrap();

    let lock = node
        .call(
            "escrow/lock",
            json!({ "caller": alice(), "amount": (40_000 * HZ).to_string(), "epochs": MAX_EPOCHS }),
        )
        .await;
    let lock_id = lock["lock_id"].as_u64().unwrap();
    node.call(
        "escrow/lock",
        json!({ "caller": bob(), "amount": (10_000 * HZ).to_string(), "epochs": MAX_EPOCHS }),
    )
    .await;

    let vote = node
        .call(
            "gauge/vote",
            json!({ "caller": alice(), "lock_ids": [lock_id], "gauge_ids": [gauge_id], "weights": [1] }),
        )
        .await;
    assert_eq!(vote["power_cast"], (40_000 * HZ).to_string());

    node.now.store(week(1), Ordering::SeqCst);
    let status = node
        .call("epoch/update", json!({ "caller": operator() }))
        .await;
    assert_eq!(status["current_epoch"], 1);

    let split = node
        .call("emission/distribute", json!({ "caller": operator() }))
        .await;
    let holders: Amount = split["holders"].as_str().unwrap().parse().unwrap();
    assert_eq!(holders, INITIAL_WEEKLY_EMISSION / 100);

    // Build the tree from the snapshot the daemon would write.
    let snapshot: HolderSnapshot =
        serde_json::from_value(node.call("escrow/snapshot", json!({})).await).unwrap();
    let distribution = Distribution::from_snapshot(&snapshot).unwrap();

    node.call(
        "distributor/update_root",
        json!({ "caller": authority(), "root": distribution.root }),
    )
    .await;

    let entry = distribution.claim_of(&bob()).unwrap();
    assert_eq!(entry.amount, holders / 5);
    let claim = node
        .call(
            "distributor/claim",
            json!({
                "account": bob(),
                "amount": entry.amount.to_string(),
                "root": distribution.root,
                "proof": entry.proof,
            }),
        )
        .await;
    assert_eq!(
        claim["holder_pool"],
        (holders - entry.amount).to_string()
    );

    let balance = node
        .call("ledger/balance", json!({ "account": bob() }))
        .await;
    assert_eq!(
        balance["balance"],
        (990_000 * HZ + entry.amount).to_string()
    );

    let emission = node.call("emission/status", json!({})).await;
    assert_eq!(emission["claimed_accounts"], 1);
    assert_eq!(emission["merkle_root"], json!(distribution.root));
}

#[tokio::test]
async fn test_failed_rpc_call_leaves_state_untouched() {
    let node = Node::start();
    let lock = node
        .call(
            "escrow/lock",
            json!({ "caller": alice(), "amount": (1_000 * HZ).to_string(), "epochs": 10 }),
        )
        .await;
    let lock_id = lock["lock_id"].as_u64().unwrap();

    // Bob does not own the lock; the unlock must fail without moving funds.
    let response = node
        .server
        .handle(JsonRpcRequest {
            method: "escrow/unlock".to_string(),
            params: json!({ "caller": bob(), "lock_ids": [lock_id] }),
        })
        .await;
    assert!(!response.success);

    let locks = node
        .call("escrow/locks_of", json!({ "owner": alice() }))
        .await;
    assert_eq!(locks["locks"].as_array().unwrap().len(), 1);
    assert_eq!(locks["locked_amount"], (1_000 * HZ).to_string());

    let balance = node
        .call("ledger/balance", json!({ "account": bob() }))
        .await;
    assert_eq!(balance["balance"], (1_000_000 * HZ).to_string());
}
