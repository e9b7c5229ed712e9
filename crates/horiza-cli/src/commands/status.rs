// crates/horiza-cli/src/commands/status.rs
//
// `horiza status`: daemon health, epoch clock, and emission state.

use serde_json::json;

use horiza_economics::EpochStatus;
use horiza_rpc::handlers::emission::EmissionStatusResponse;
use horiza_rpc::handlers::node::GetHealthResponse;

use crate::commands::epoch::print_epoch_status;
use crate::commands::Ctx;
use crate::output::{format_json, hz, OutputFormat};
use crate::rpc_client::call;

/// Run the status command.
pub async fn run(ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let health: GetHealthResponse = call(&ctx.rpc, "node/health", json!({})).await?;
    let epoch: EpochStatus = call(&ctx.rpc, "epoch/status", json!({})).await?;
    let emission: EmissionStatusResponse = call(&ctx.rpc, "emission/status", json!({})).await?;

    if ctx.format == OutputFormat::Json {
        println!(
            "{}",
            format_json(&json!({ "health": health, "epoch": epoch, "emission": emission }))
        );
        return Ok(());
    }

    println!("Horiza Protocol v{}", health.version);
    println!();
    println!("Node Status");
    println!("-----------");
    println!("  RPC endpoint: {}", ctx.rpc);
    println!("  Status:       {}", health.status);
    println!("  Uptime:       {}s", health.uptime_seconds);
    if let Some(count) = health.lock_count {
        println!("  Locks:        {}", count);
    }
    println!();
    print_epoch_status(&epoch);
    println!();

    let state = &emission.state;
    println!("Emission");
    println!("--------");
    println!("  Weekly emission:        {}", hz(state.weekly_emission));
    println!("  Previous epoch:         {}", hz(state.emission_for_previous_epoch));
    println!(
        "  Stored for LPs:         {}",
        hz(state.stored_emission_for_liquidity_providers)
    );
    println!(
        "  Holder pool:            {}",
        hz(state.cumulative_emission_for_holders)
    );
    println!("  Total emitted:          {}", hz(state.total_emitted));
    println!("  Total claimed:          {}", hz(state.total_claimed));
    println!(
        "  Split (bps):            team {} / holders {} / decay {}",
        emission.policy.team_bps, emission.policy.holder_bps, emission.policy.emission_decay_bps
    );
    match emission.merkle_root {
        Some(root) => println!(
            "  Merkle root:            {} (update #{}, {} claimed)",
            root, emission.root_updates, emission.claimed_accounts
        ),
        None => println!("  Merkle root:            not published"),
    }

    Ok(())
}
