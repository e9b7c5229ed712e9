// crates/horiza-core/src/traits.rs

use crate::error::HorizaError;
use crate::types::{Address, Amount};

/// The fungible balance ledger the protocol moves value through.
///
/// The ledger itself is an external collaborator. Implementations must
/// conserve value: every `debit` of an account either fails without effect
/// or removes exactly `amount`, and every `credit` adds exactly `amount`.
/// The only credits without a matching debit are emission mints.
///
/// Implemented by `horiza_economics::ledger::InMemoryLedger`.
pub trait Ledger: Send {
    /// Remove `amount` from `account`. Fails with
    /// `HorizaError::InsufficientBalance` when the balance is too small.
    fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), HorizaError>;

    /// Add `amount` to `account`.
    fn credit(&mut self, account: &Address, amount: Amount) -> Result<(), HorizaError>;

    /// Current balance of `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &Address) -> Amount;
}
