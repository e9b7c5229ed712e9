// crates/horiza-cli/src/commands/tree.rs
//
// `horiza tree {build, proof, verify, publish}`: the off-chain holder claim
// tree.
//
// `build` turns a holder snapshot (a file the daemon wrote under
// snapshots/, or a fresh one fetched over RPC) into a distribution file:
// the root plus every account's amount and proof. `publish` sends that root
// to the distributor as the Merkle root authority.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::json;
use tabled::Tabled;

use horiza_core::{Address, HorizaError, Hash32};
use horiza_economics::HolderSnapshot;
use horiza_merkle::{Distribution, Share};
use horiza_rpc::handlers::distributor::UpdateRootResponse;

use crate::commands::Ctx;
use crate::output::{emit, format_json, hz, OutputFormat};
use crate::rpc_client::call;

/// Claim tree subcommands.
#[derive(Debug, Subcommand)]
pub enum TreeCmd {
    /// Build a distribution from a holder snapshot.
    Build {
        /// Snapshot file; fetched from the daemon when omitted.
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Where to write the distribution.
        #[arg(long, default_value = "distribution.json")]
        out: PathBuf,
    },
    /// Print one account's amount and proof.
    Proof {
        #[arg(long)]
        distribution: PathBuf,
        #[arg(long)]
        account: Address,
    },
    /// Rebuild the tree from a distribution file and check every proof.
    Verify {
        #[arg(long)]
        distribution: PathBuf,
    },
    /// Publish the distribution's root (Merkle root authority only).
    Publish {
        #[arg(long)]
        distribution: PathBuf,
        #[arg(long)]
        from: Address,
    },
}

#[derive(Tabled)]
struct ClaimRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Proof Length")]
    proof_len: usize,
}

pub fn read_distribution(path: &Path) -> Result<Distribution, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(serde_json::from_slice(&bytes).map_err(HorizaError::from)?)
}

fn read_snapshot(path: &Path) -> Result<HolderSnapshot, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(serde_json::from_slice(&bytes).map_err(HorizaError::from)?)
}

/// Check a distribution file end to end: the claims rebuild the recorded
/// root, every proof verifies, and the total matches and fits the pool.
pub fn verify_distribution(distribution: &Distribution) -> Result<(), HorizaError> {
    let shares: Vec<Share> = distribution
        .claims
        .iter()
        .map(|(account, entry)| Share {
            account: *account,
            amount: entry.amount,
        })
        .collect();
    let rebuilt = Distribution::from_shares(distribution.epoch, distribution.holder_pool, &shares)?;

    if rebuilt.root != distribution.root {
        return Err(HorizaError::InvalidInput(format!(
            "claims rebuild root {}, file records {}",
            rebuilt.root, distribution.root
        )));
    }
    if rebuilt.total != distribution.total {
        return Err(HorizaError::InvalidInput(format!(
            "claims sum to {}, file records {}",
            rebuilt.total, distribution.total
        )));
    }
    if distribution.total > distribution.holder_pool {
        return Err(HorizaError::ClaimExceedsPool {
            requested: distribution.total,
            available: distribution.holder_pool,
        });
    }
    let failing = distribution.verify();
    if let Some(account) = failing.first() {
        return Err(HorizaError::InvalidInput(format!(
            "{} proof(s) fail against the root, first {}",
            failing.len(),
            account
        )));
    }
    Ok(())
}

/// Run the tree subcommand.
pub async fn run(ctx: &Ctx, cmd: &TreeCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TreeCmd::Build { snapshot, out } => {
            let snapshot = match snapshot {
                Some(path) => read_snapshot(path)?,
                None => call(&ctx.rpc, "escrow/snapshot", json!({})).await?,
            };
            let distribution = Distribution::from_snapshot(&snapshot)?;
            fs::write(out, format_json(&distribution))
                .map_err(|e| format!("{}: {}", out.display(), e))?;

            match ctx.format {
                OutputFormat::Table => {
                    println!("Distribution for epoch {}", distribution.epoch);
                    println!("  Root:        {}", distribution.root);
                    println!("  Accounts:    {}", distribution.claims.len());
                    println!("  Total:       {}", hz(distribution.total));
                    println!("  Holder pool: {}", hz(distribution.holder_pool));
                    println!("  Written to:  {}", out.display());
                }
                OutputFormat::Json => println!("{}", format_json(&distribution)),
            }
        }
        TreeCmd::Proof {
            distribution,
            account,
        } => {
            let distribution = read_distribution(distribution)?;
            let entry = distribution
                .claim_of(account)
                .ok_or_else(|| format!("{} has no claim in this distribution", account))?;
            match ctx.format {
                OutputFormat::Table => {
                    println!("Account: {}", account);
                    println!("Amount:  {} ({} wei)", hz(entry.amount), entry.amount);
                    println!("Root:    {}", distribution.root);
                    println!("Proof:");
                    for node in &entry.proof {
                        println!("  {}", node);
                    }
                }
                OutputFormat::Json => println!("{}", format_json(entry)),
            }
        }
        TreeCmd::Verify { distribution } => {
            let distribution = read_distribution(distribution)?;
            verify_distribution(&distribution)?;
            let rows: Vec<ClaimRow> = distribution
                .claims
                .iter()
                .map(|(account, entry)| ClaimRow {
                    account: account.to_string(),
                    amount: hz(entry.amount),
                    proof_len: entry.proof.len(),
                })
                .collect();
            emit(ctx.format, &rows, &distribution);
            if ctx.format == OutputFormat::Table {
                println!("OK: {} claims verify against {}", rows.len(), distribution.root);
            }
        }
        TreeCmd::Publish { distribution, from } => {
            let distribution = read_distribution(distribution)?;
            verify_distribution(&distribution)?;
            let root: Hash32 = distribution.root;
            let resp: UpdateRootResponse = call(
                &ctx.rpc,
                "distributor/update_root",
                json!({ "caller": from, "root": root }),
            )
            .await?;
            match ctx.format {
                OutputFormat::Table => println!(
                    "Published root {} (update #{})",
                    resp.root, resp.root_updates
                ),
                OutputFormat::Json => println!("{}", format_json(&resp)),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use horiza_economics::HolderEntry;

    fn distribution() -> Distribution {
        let snapshot = HolderSnapshot {
            epoch: 2,
            total_locked: 400,
            holder_pool: 1_000,
            merkle_root: None,
            holders: vec![
                HolderEntry {
                    address: Address([0xa1; 20]),
                    locked_amount: 300,
                    power: 300,
                    lock_count: 1,
                },
                HolderEntry {
                    address: Address([0xb0; 20]),
                    locked_amount: 100,
                    power: 50,
                    lock_count: 2,
                },
                HolderEntry {
                    address: Address([0xc0; 20]),
                    locked_amount: 0,
                    power: 0,
                    lock_count: 0,
                },
            ],
        };
        Distribution::from_snapshot(&snapshot).unwrap()
    }

    #[test]
    fn test_built_distribution_verifies() {
        let d = distribution();
        assert_eq!(d.claims.len(), 2);
        assert_eq!(d.total, 1_000);
        verify_distribution(&d).unwrap();
    }

    #[test]
    fn test_tampered_amount_detected() {
        let mut d = distribution();
        if let Some(entry) = d.claims.get_mut(&Address([0xb0; 20])) {
            entry.amount += 1;
        }
        assert!(verify_distribution(&d).is_err());
    }

    #[test]
    fn test_tampered_root_detected() {
        let mut d = distribution();
        d.root = Hash32([7; 32]);
        assert!(verify_distribution(&d).is_err());
    }

    #[test]
    fn test_distribution_file_roundtrip() {
        let d = distribution();
        let path = std::env::temp_dir().join(format!(
            "horiza_cli_tree_{}_{}.json",
            std::process::id(),
            d.epoch
        ));
        fs::write(&path, format_json(&d)).unwrap();
        let read = read_distribution(&path).unwrap();
        assert_eq!(read, d);
        fs::remove_file(path).unwrap();
    }
}
