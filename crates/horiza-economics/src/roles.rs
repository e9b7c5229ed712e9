// crates/horiza-economics/src/roles.rs
//
// Privileged protocol roles.
//
//   - operator:  creates gauges, advances epochs, distributes emission.
//   - authority: publishes the holder-reward Merkle root.
//   - team:      receives the team share of every emission.

use serde::{Deserialize, Serialize};

use horiza_core::{Address, HorizaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub operator: Address,
    pub authority: Address,
    pub team: Address,
}

impl Roles {
    /// Fail with `Unauthorized` unless `caller` is the operator.
    pub fn ensure_operator(&self, caller: &Address, action: &str) -> Result<()> {
        ensure_role(&self.operator, caller, action)
    }

    /// Fail with `Unauthorized` unless `caller` is the Merkle root authority.
    pub fn ensure_authority(&self, caller: &Address, action: &str) -> Result<()> {
        ensure_role(&self.authority, caller, action)
    }
}

fn ensure_role(holder: &Address, caller: &Address, action: &str) -> Result<()> {
    if holder != caller {
        return Err(HorizaError::Unauthorized {
            caller: *caller,
            action: action.to_string(),
        });
    }
    Ok(())
}
