// crates/horiza-economics/src/ledger.rs
//
// Balance ledgers.
//
// `InMemoryLedger` is the account book the daemon runs against: a map of
// balances plus a running supply figure, serializable alongside protocol
// state. `LedgerJournal` wraps any ledger for the duration of one protocol
// operation and records each movement so a failed operation can be
// compensated in reverse order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use horiza_core::{Address, Amount, HorizaError, Ledger, Result};

/// A fungible-token ledger held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: HashMap<Address, Amount>,
    /// Sum of every balance.
    total_supply: Amount,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from genesis balances.
    pub fn with_balances<I>(balances: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Address, Amount)>,
    {
        let mut ledger = Self::new();
        for (account, amount) in balances {
            ledger.mint(&account, amount)?;
        }
        Ok(ledger)
    }

    /// Create new tokens in `account`.
    pub fn mint(&mut self, account: &Address, amount: Amount) -> Result<()> {
        self.credit(account, amount)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Accounts with a non-zero balance.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }
}

impl Ledger for InMemoryLedger {
    fn debit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(account);
        if amount > available {
            return Err(HorizaError::InsufficientBalance {
                account: *account,
                requested: amount,
                available,
            });
        }
        if amount == 0 {
            return Ok(());
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        self.total_supply -= amount;
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| HorizaError::ArithmeticOverflow("ledger supply".to_string()))?;
        let balance = self.balances.entry(*account).or_insert(0);
        // Cannot overflow: every balance is bounded by the supply.
        *balance += amount;
        self.total_supply = new_supply;
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
enum Movement {
    Debit(Address, Amount),
    Credit(Address, Amount),
}

/// Records ledger movements made during one operation.
///
/// Either `commit` (keep the movements) or `rollback` (apply the inverse
/// movements newest-first) must end the journal.
pub struct LedgerJournal<'a, L: Ledger + ?Sized> {
    inner: &'a mut L,
    movements: Vec<Movement>,
}

impl<'a, L: Ledger + ?Sized> LedgerJournal<'a, L> {
    pub fn new(inner: &'a mut L) -> Self {
        Self {
            inner,
            movements: Vec::new(),
        }
    }

    /// Number of movements recorded so far.
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Keep every recorded movement. Returns how many there were.
    pub fn commit(self) -> usize {
        self.movements.len()
    }

    /// Undo every recorded movement, newest first.
    pub fn rollback(self) {
        for movement in self.movements.into_iter().rev() {
            let undone = match movement {
                Movement::Debit(account, amount) => self.inner.credit(&account, amount),
                Movement::Credit(account, amount) => self.inner.debit(&account, amount),
            };
            if let Err(e) = undone {
                tracing::error!(?movement, error = %e, "Failed to compensate ledger movement");
            }
        }
    }
}

impl<L: Ledger + ?Sized> Ledger for LedgerJournal<'_, L> {
    fn debit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        self.inner.debit(account, amount)?;
        self.movements.push(Movement::Debit(*account, amount));
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        self.inner.credit(account, amount)?;
        self.movements.push(Movement::Credit(*account, amount));
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.inner.balance_of(account)
    }
}
