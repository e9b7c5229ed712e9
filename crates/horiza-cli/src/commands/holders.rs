// crates/horiza-cli/src/commands/holders.rs
//
// `horiza holders`: every lock holder from the current snapshot.

use serde_json::json;
use tabled::Tabled;

use horiza_economics::HolderSnapshot;

use crate::commands::Ctx;
use crate::output::{emit, hz, OutputFormat};
use crate::rpc_client::call;

#[derive(Tabled)]
struct HolderRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Holder")]
    address: String,
    #[tabled(rename = "Locks")]
    lock_count: usize,
    #[tabled(rename = "Locked")]
    locked: String,
    #[tabled(rename = "Power")]
    power: String,
}

fn holder_rows(snapshot: &HolderSnapshot) -> Vec<HolderRow> {
    snapshot
        .holders
        .iter()
        .enumerate()
        .map(|(index, holder)| HolderRow {
            index,
            address: holder.address.to_string(),
            lock_count: holder.lock_count,
            locked: hz(holder.locked_amount),
            power: hz(holder.power),
        })
        .collect()
}

/// Run the holders command.
pub async fn run(ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot: HolderSnapshot = call(&ctx.rpc, "escrow/snapshot", json!({})).await?;
    if ctx.format == OutputFormat::Table {
        println!(
            "Epoch {}  |  Holders: {}  |  Total locked: {}",
            snapshot.epoch,
            snapshot.holders.len(),
            hz(snapshot.total_locked)
        );
        println!();
    }
    emit(ctx.format, &holder_rows(&snapshot), &snapshot);
    Ok(())
}
