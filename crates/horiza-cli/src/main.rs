// crates/horiza-cli/src/main.rs
//
// CLI entrypoint for the Horiza Protocol.
//
// Provides subcommands for managing escrow locks, voting on gauges,
// operating epochs, claiming holder rewards, and building the holder
// claim tree off-chain.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};

use commands::epoch::EpochCmd;
use commands::escrow::{
    ExtendArgs, IncreaseArgs, LockArgs, LocksArgs, MergeArgs, TransferArgs, UnlockArgs,
};
use commands::gauge::{GaugesCmd, VoteArgs};
use commands::claim::{BalanceArgs, ClaimArgs};
use commands::tree::TreeCmd;
use commands::Ctx;
use output::OutputFormat;

/// Horiza Protocol CLI.
#[derive(Parser, Debug)]
#[command(
    name = "horiza",
    version = "0.1.0",
    about = "Horiza Protocol CLI: voting escrow, gauges, emission, and holder claims"
)]
struct Cli {
    /// RPC endpoint for the horiza-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50061")]
    rpc: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Lock HZ for a number of epochs.
    Lock(LockArgs),

    /// Add HZ to an existing lock.
    Increase(IncreaseArgs),

    /// Add epochs to an existing lock.
    Extend(ExtendArgs),

    /// Merge two locks into a new one.
    Merge(MergeArgs),

    /// Release matured locks.
    Unlock(UnlockArgs),

    /// Hand a lock to another account.
    Transfer(TransferArgs),

    /// List the locks of an account.
    Locks(LocksArgs),

    /// Vote on gauges with one or more locks.
    Vote(VoteArgs),

    /// Claim a holder reward from a distribution file.
    Claim(ClaimArgs),

    /// Show an account's HZ balance.
    Balance(BalanceArgs),

    /// Gauge management: list, create, tallies.
    #[command(subcommand)]
    Gauges(GaugesCmd),

    /// Epoch operations: status, update, distribute.
    #[command(subcommand)]
    Epoch(EpochCmd),

    /// Display daemon health, epoch, and emission state.
    Status,

    /// Display lock holders with their locked amount and power.
    Holders,

    /// Holder claim tree: build, proof, verify, publish.
    #[command(subcommand)]
    Tree(TreeCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let ctx = Ctx {
        rpc: cli.rpc.clone(),
        format: OutputFormat::from_flag(cli.json),
    };

    match &cli.command {
        Commands::Lock(args) => commands::escrow::lock(&ctx, args).await?,
        Commands::Increase(args) => commands::escrow::increase(&ctx, args).await?,
        Commands::Extend(args) => commands::escrow::extend(&ctx, args).await?,
        Commands::Merge(args) => commands::escrow::merge(&ctx, args).await?,
        Commands::Unlock(args) => commands::escrow::unlock(&ctx, args).await?,
        Commands::Transfer(args) => commands::escrow::transfer(&ctx, args).await?,
        Commands::Locks(args) => commands::escrow::locks(&ctx, args).await?,
        Commands::Vote(args) => commands::gauge::vote(&ctx, args).await?,
        Commands::Claim(args) => commands::claim::claim(&ctx, args).await?,
        Commands::Balance(args) => commands::claim::balance(&ctx, args).await?,
        Commands::Gauges(cmd) => commands::gauge::run(&ctx, cmd).await?,
        Commands::Epoch(cmd) => commands::epoch::run(&ctx, cmd).await?,
        Commands::Status => commands::status::run(&ctx).await?,
        Commands::Holders => commands::holders::run(&ctx).await?,
        Commands::Tree(cmd) => commands::tree::run(&ctx, cmd).await?,
    }

    Ok(())
}
