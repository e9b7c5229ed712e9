// crates/horiza-cli/src/commands/escrow.rs
//
// `horiza {lock, increase, extend, merge, unlock, transfer, locks}`:
// voting-escrow commands.

use clap::Args;
use serde_json::json;
use tabled::Tabled;

use horiza_core::{Address, LockId};
use horiza_economics::{Hz, MAX_EPOCHS};
use horiza_rpc::handlers::escrow::{LockView, LocksOfResponse, UnlockResponse};

use crate::commands::Ctx;
use crate::output::{emit, format_json, hz, OutputFormat};
use crate::rpc_client::call;

/// A row in the lock table.
#[derive(Tabled)]
pub struct LockRow {
    #[tabled(rename = "Lock")]
    lock_id: LockId,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Locked")]
    locked: String,
    #[tabled(rename = "Epochs Left")]
    epochs_remaining: u64,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Created")]
    creation_epoch: u64,
}

impl From<&LockView> for LockRow {
    fn from(view: &LockView) -> Self {
        Self {
            lock_id: view.lock_id,
            owner: view.lock.owner.to_string(),
            locked: hz(view.lock.locked_amount),
            epochs_remaining: view.lock.epochs_remaining,
            power: hz(view.power),
            creation_epoch: view.lock.creation_epoch,
        }
    }
}

fn print_lock(ctx: &Ctx, view: &LockView) {
    emit(ctx.format, &[LockRow::from(view)], view);
}

#[derive(Debug, Args)]
pub struct LockArgs {
    /// Account that owns the new lock.
    #[arg(long)]
    pub from: Address,
    /// Amount in HZ ("1000", "0.5") or wei ("42wei").
    #[arg(long)]
    pub amount: Hz,
    /// Lock term in epochs (1..=104).
    #[arg(long, default_value_t = MAX_EPOCHS)]
    pub epochs: u64,
}

pub async fn lock(ctx: &Ctx, args: &LockArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view: LockView = call(
        &ctx.rpc,
        "escrow/lock",
        json!({ "caller": args.from, "amount": args.amount.wei.to_string(), "epochs": args.epochs }),
    )
    .await?;
    print_lock(ctx, &view);
    Ok(())
}

#[derive(Debug, Args)]
pub struct IncreaseArgs {
    #[arg(long)]
    pub from: Address,
    #[arg(long)]
    pub lock_id: LockId,
    /// Amount in HZ ("1000", "0.5") or wei ("42wei").
    #[arg(long)]
    pub amount: Hz,
}

pub async fn increase(ctx: &Ctx, args: &IncreaseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view: LockView = call(
        &ctx.rpc,
        "escrow/increase",
        json!({ "caller": args.from, "lock_id": args.lock_id, "amount": args.amount.wei.to_string() }),
    )
    .await?;
    print_lock(ctx, &view);
    Ok(())
}

#[derive(Debug, Args)]
pub struct ExtendArgs {
    #[arg(long)]
    pub from: Address,
    #[arg(long)]
    pub lock_id: LockId,
    /// Epochs to add; the total may not exceed 104.
    #[arg(long)]
    pub epochs: u64,
}

pub async fn extend(ctx: &Ctx, args: &ExtendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view: LockView = call(
        &ctx.rpc,
        "escrow/extend",
        json!({ "caller": args.from, "lock_id": args.lock_id, "epochs": args.epochs }),
    )
    .await?;
    print_lock(ctx, &view);
    Ok(())
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[arg(long)]
    pub from: Address,
    #[arg(long)]
    pub first: LockId,
    #[arg(long)]
    pub second: LockId,
}

pub async fn merge(ctx: &Ctx, args: &MergeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view: LockView = call(
        &ctx.rpc,
        "escrow/merge",
        json!({ "caller": args.from, "first": args.first, "second": args.second }),
    )
    .await?;
    if ctx.format == OutputFormat::Table {
        println!("Locks {} and {} merged into lock {}", args.first, args.second, view.lock_id);
    }
    print_lock(ctx, &view);
    Ok(())
}

#[derive(Debug, Args)]
pub struct UnlockArgs {
    #[arg(long)]
    pub from: Address,
    /// Comma-separated lock ids.
    #[arg(long, value_delimiter = ',', required = true)]
    pub lock_ids: Vec<LockId>,
}

pub async fn unlock(ctx: &Ctx, args: &UnlockArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resp: UnlockResponse = call(
        &ctx.rpc,
        "escrow/unlock",
        json!({ "caller": args.from, "lock_ids": args.lock_ids }),
    )
    .await?;
    match ctx.format {
        OutputFormat::Table => {
            println!("Unlocked {} lock(s)", resp.lock_ids.len());
            println!("  Released: {}", hz(resp.released));
            println!("  Balance:  {}", hz(resp.balance));
        }
        OutputFormat::Json => println!("{}", format_json(&resp)),
    }
    Ok(())
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    #[arg(long)]
    pub from: Address,
    #[arg(long)]
    pub lock_id: LockId,
    #[arg(long)]
    pub to: Address,
}

pub async fn transfer(ctx: &Ctx, args: &TransferArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view: LockView = call(
        &ctx.rpc,
        "escrow/transfer",
        json!({ "caller": args.from, "lock_id": args.lock_id, "to": args.to }),
    )
    .await?;
    print_lock(ctx, &view);
    Ok(())
}

#[derive(Debug, Args)]
pub struct LocksArgs {
    #[arg(long)]
    pub owner: Address,
}

pub async fn locks(ctx: &Ctx, args: &LocksArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resp: LocksOfResponse =
        call(&ctx.rpc, "escrow/locks_of", json!({ "owner": args.owner })).await?;
    let rows: Vec<LockRow> = resp.locks.iter().map(LockRow::from).collect();
    emit(ctx.format, &rows, &resp);
    if ctx.format == OutputFormat::Table {
        println!(
            "Total locked: {}  |  Total power: {}",
            hz(resp.locked_amount),
            hz(resp.power)
        );
    }
    Ok(())
}
