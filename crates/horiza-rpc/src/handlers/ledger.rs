// crates/horiza-rpc/src/handlers/ledger.rs
//
// Ledger handler: GetBalance.

use serde::{Deserialize, Serialize};

use horiza_core::types::amount_string;
use horiza_core::{Address, Amount};
use horiza_economics::Hz;

use crate::engine::EngineHandle;
use crate::handlers::rpc_error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub account: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: Address,
    /// Balance in wei.
    #[serde(with = "amount_string")]
    pub balance: Amount,
    /// Balance formatted in HZ.
    pub display: String,
}

pub async fn handle_get_balance(
    engine: &EngineHandle,
    request: BalanceRequest,
) -> Result<BalanceResponse, String> {
    let account = request.account;
    let balance = engine
        .call(move |e| e.balance_of(&account))
        .await
        .map_err(rpc_error)?;
    Ok(BalanceResponse {
        account,
        balance,
        display: Hz::from_wei(balance).to_string(),
    })
}
