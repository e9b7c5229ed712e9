// crates/horiza-cli/src/commands/mod.rs
//
// Command module declarations for the Horiza CLI.

pub mod claim;
pub mod epoch;
pub mod escrow;
pub mod gauge;
pub mod holders;
pub mod status;
pub mod tree;

use crate::output::OutputFormat;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Ctx {
    /// Daemon RPC endpoint.
    pub rpc: String,
    pub format: OutputFormat,
}
