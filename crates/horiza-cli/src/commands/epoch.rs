// crates/horiza-cli/src/commands/epoch.rs
//
// `horiza epoch {status, update, distribute}`: epoch clock and emission
// operations. `update` and `distribute` must be sent by the operator.

use clap::Subcommand;
use serde_json::json;

use horiza_core::Address;
use horiza_economics::{EmissionSplit, EpochStatus};

use crate::commands::Ctx;
use crate::output::{format_json, hz, OutputFormat};
use crate::rpc_client::call;

/// Epoch subcommands.
#[derive(Debug, Subcommand)]
pub enum EpochCmd {
    /// Show the current epoch and when the next one is due.
    Status,
    /// Advance to the next epoch once its start time has passed.
    Update {
        #[arg(long)]
        from: Address,
    },
    /// Distribute the current epoch's emission.
    Distribute {
        #[arg(long)]
        from: Address,
    },
}

pub fn print_epoch_status(status: &EpochStatus) {
    println!("Epoch");
    println!("-----");
    println!("  Current epoch:  {}", status.current_epoch);
    println!("  Epoch length:   {}s", status.epoch_duration);
    println!("  Last advance:   {}", status.last_advance);
    println!(
        "  Next epoch at:  {} (in {}s)",
        status.next_epoch_at, status.seconds_until_next
    );
    println!(
        "  Distributed:    {}",
        if status.distributed { "yes" } else { "no" }
    );
}

fn print_split(split: &EmissionSplit) {
    println!("Emission for epoch {}", split.epoch);
    println!("  Total:               {}", hz(split.emission));
    println!("  Team:                {}", hz(split.team));
    println!("  Liquidity providers: {}", hz(split.liquidity_providers));
    println!("  Holders:             {}", hz(split.holders));
    println!("  Allocated to gauges: {}", hz(split.allocated_to_gauges));
}

/// Run the epoch subcommand.
pub async fn run(ctx: &Ctx, cmd: &EpochCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        EpochCmd::Status => {
            let status: EpochStatus = call(&ctx.rpc, "epoch/status", json!({})).await?;
            match ctx.format {
                OutputFormat::Table => print_epoch_status(&status),
                OutputFormat::Json => println!("{}", format_json(&status)),
            }
        }
        EpochCmd::Update { from } => {
            let status: EpochStatus =
                call(&ctx.rpc, "epoch/update", json!({ "caller": from })).await?;
            match ctx.format {
                OutputFormat::Table => print_epoch_status(&status),
                OutputFormat::Json => println!("{}", format_json(&status)),
            }
        }
        EpochCmd::Distribute { from } => {
            let split: EmissionSplit =
                call(&ctx.rpc, "emission/distribute", json!({ "caller": from })).await?;
            match ctx.format {
                OutputFormat::Table => print_split(&split),
                OutputFormat::Json => println!("{}", format_json(&split)),
            }
        }
    }

    Ok(())
}
