// crates/horiza-cli/src/commands/gauge.rs
//
// `horiza gauges {list, create, tallies}` and `horiza vote`.

use clap::{Args, Subcommand};
use serde_json::json;
use tabled::Tabled;

use horiza_core::{Address, Amount, Epoch, GaugeId, LockId};
use horiza_economics::Gauge;
use horiza_rpc::handlers::gauge::{ListGaugesResponse, TalliesResponse, TallyEntry, VoteResponse};

use crate::commands::Ctx;
use crate::output::{emit, format_json, format_table, hz, OutputFormat};
use crate::rpc_client::call;

/// Gauge subcommands.
#[derive(Debug, Subcommand)]
pub enum GaugesCmd {
    /// List every gauge with its reward period.
    List,
    /// Register a gauge for a strategy (operator only).
    Create {
        #[arg(long)]
        from: Address,
        /// Strategy the gauge pays out to.
        #[arg(long)]
        strategy: Address,
    },
    /// Show live and finalized vote tallies.
    Tallies,
}

#[derive(Tabled)]
struct GaugeRow {
    #[tabled(rename = "Gauge")]
    id: GaugeId,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Reward Rate (wei/s)")]
    reward_rate: Amount,
    #[tabled(rename = "Period Reward")]
    reward_for_period: String,
    #[tabled(rename = "Period Ends")]
    period_finish: u64,
    #[tabled(rename = "Lifetime")]
    total_rewards: String,
    #[tabled(rename = "Created")]
    created_epoch: Epoch,
}

impl From<&Gauge> for GaugeRow {
    fn from(gauge: &Gauge) -> Self {
        Self {
            id: gauge.id,
            strategy: gauge.strategy.to_string(),
            reward_rate: gauge.reward_rate,
            reward_for_period: hz(gauge.reward_for_period),
            period_finish: gauge.period_finish,
            total_rewards: hz(gauge.total_rewards),
            created_epoch: gauge.created_epoch,
        }
    }
}

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "Gauge")]
    gauge_id: GaugeId,
    #[tabled(rename = "Votes")]
    votes: String,
    #[tabled(rename = "Share")]
    share: String,
}

/// Tally rows with each gauge's share of `total` in percent.
fn tally_rows(entries: &[TallyEntry], total: Amount) -> Vec<TallyRow> {
    entries
        .iter()
        .map(|entry| TallyRow {
            gauge_id: entry.gauge_id,
            votes: hz(entry.votes),
            share: if total == 0 {
                "-".to_string()
            } else {
                // Basis points keep two decimals without floats.
                let bps = entry.votes.saturating_mul(10_000) / total;
                format!("{}.{:02}%", bps / 100, bps % 100)
            },
        })
        .collect()
}

/// Run the gauges subcommand.
pub async fn run(ctx: &Ctx, cmd: &GaugesCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        GaugesCmd::List => {
            let resp: ListGaugesResponse = call(&ctx.rpc, "gauge/list", json!({})).await?;
            if resp.gauges.is_empty() && ctx.format == OutputFormat::Table {
                println!("No gauges registered.");
                return Ok(());
            }
            let rows: Vec<GaugeRow> = resp.gauges.iter().map(GaugeRow::from).collect();
            emit(ctx.format, &rows, &resp);
        }
        GaugesCmd::Create { from, strategy } => {
            let gauge: Gauge = call(
                &ctx.rpc,
                "gauge/create",
                json!({ "caller": from, "strategy": strategy }),
            )
            .await?;
            emit(ctx.format, &[GaugeRow::from(&gauge)], &gauge);
        }
        GaugesCmd::Tallies => {
            let resp: TalliesResponse = call(&ctx.rpc, "gauge/tallies", json!({})).await?;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&resp)),
                OutputFormat::Table => {
                    println!("Epoch {} (live), total {}", resp.epoch, hz(resp.live_total));
                    println!("{}", format_table(&tally_rows(&resp.live, resp.live_total)));
                    match &resp.finalized {
                        Some(finalized) => {
                            println!();
                            println!(
                                "Epoch {} (finalized), total {}",
                                finalized.epoch,
                                hz(finalized.total)
                            );
                            println!(
                                "{}",
                                format_table(&tally_rows(
                                    &finalized.tallies,
                                    finalized.total
                                ))
                            );
                        }
                        None => println!("No finalized epoch yet."),
                    }
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Args)]
pub struct VoteArgs {
    #[arg(long)]
    pub from: Address,
    /// Comma-separated lock ids whose power is cast.
    #[arg(long, value_delimiter = ',', required = true)]
    pub lock_ids: Vec<LockId>,
    /// Comma-separated gauge ids.
    #[arg(long, value_delimiter = ',', required = true)]
    pub gauge_ids: Vec<GaugeId>,
    /// Comma-separated relative weights, one per gauge.
    #[arg(long, value_delimiter = ',', required = true)]
    pub weights: Vec<u64>,
}

pub async fn vote(ctx: &Ctx, args: &VoteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resp: VoteResponse = call(
        &ctx.rpc,
        "gauge/vote",
        json!({
            "caller": args.from,
            "lock_ids": args.lock_ids,
            "gauge_ids": args.gauge_ids,
            "weights": args.weights,
        }),
    )
    .await?;
    match ctx.format {
        OutputFormat::Table => println!(
            "Cast {} across {} gauge(s) for epoch {}",
            hz(resp.power_cast),
            args.gauge_ids.len(),
            resp.epoch
        ),
        OutputFormat::Json => println!("{}", format_json(&resp)),
    }
    Ok(())
}
