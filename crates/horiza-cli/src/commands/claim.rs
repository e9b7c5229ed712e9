// crates/horiza-cli/src/commands/claim.rs
//
// `horiza claim` and `horiza balance`.
//
// A claim reads the account's entry from a distribution file written by
// `horiza tree build` and submits it against the root recorded there.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use horiza_core::{Address, HorizaError};
use horiza_merkle::Distribution;
use horiza_rpc::handlers::distributor::ClaimResponse;
use horiza_rpc::handlers::ledger::BalanceResponse;

use crate::commands::tree::read_distribution;
use crate::commands::Ctx;
use crate::output::{format_json, hz, OutputFormat};
use crate::rpc_client::call;

#[derive(Debug, Args)]
pub struct ClaimArgs {
    /// Account to claim for.
    #[arg(long)]
    pub account: Address,
    /// Distribution file from `horiza tree build`.
    #[arg(long)]
    pub distribution: PathBuf,
}

/// Claim request parameters for `account` from `distribution`.
pub fn claim_params(
    distribution: &Distribution,
    account: &Address,
) -> Result<serde_json::Value, HorizaError> {
    let entry = distribution.claim_of(account).ok_or_else(|| {
        HorizaError::InvalidInput(format!(
            "{} has no claim in the epoch {} distribution",
            account, distribution.epoch
        ))
    })?;
    Ok(json!({
        "account": account,
        "amount": entry.amount.to_string(),
        "root": distribution.root,
        "proof": entry.proof,
    }))
}

pub async fn claim(ctx: &Ctx, args: &ClaimArgs) -> Result<(), Box<dyn std::error::Error>> {
    let distribution = read_distribution(&args.distribution)?;
    let params = claim_params(&distribution, &args.account)?;
    let resp: ClaimResponse = call(&ctx.rpc, "distributor/claim", params).await?;
    match ctx.format {
        OutputFormat::Table => {
            println!("Claimed {} for {}", hz(resp.amount), resp.account);
            println!("  Balance:          {}", hz(resp.balance));
            println!("  Holder pool left: {}", hz(resp.holder_pool));
        }
        OutputFormat::Json => println!("{}", format_json(&resp)),
    }
    Ok(())
}

#[derive(Debug, Args)]
pub struct BalanceArgs {
    #[arg(long)]
    pub account: Address,
}

pub async fn balance(ctx: &Ctx, args: &BalanceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resp: BalanceResponse =
        call(&ctx.rpc, "ledger/balance", json!({ "account": args.account })).await?;
    match ctx.format {
        OutputFormat::Table => println!("{}: {}", resp.account, resp.display),
        OutputFormat::Json => println!("{}", format_json(&resp)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use horiza_merkle::Share;

    #[test]
    fn test_claim_params_carry_proof_and_root() {
        let shares = vec![
            Share {
                account: Address([0xa1; 20]),
                amount: 300,
            },
            Share {
                account: Address([0xb0; 20]),
                amount: 100,
            },
        ];
        let distribution = Distribution::from_shares(1, 400, &shares).unwrap();
        let params = claim_params(&distribution, &Address([0xa1; 20])).unwrap();

        assert_eq!(params["amount"], "300");
        assert_eq!(params["root"], json!(distribution.root));
        assert_eq!(params["proof"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_claim_params_unknown_account() {
        let shares = vec![Share {
            account: Address([0xa1; 20]),
            amount: 1,
        }];
        let distribution = Distribution::from_shares(1, 1, &shares).unwrap();
        assert!(matches!(
            claim_params(&distribution, &Address([0xcc; 20])),
            Err(HorizaError::InvalidInput(_))
        ));
    }
}
