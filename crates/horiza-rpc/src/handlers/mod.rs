// crates/horiza-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for one method group.
//
// Handlers return `Result<_, String>`; engine errors are rendered as
// "<Code>: <message>" so clients can match on the stable code prefix.

use horiza_core::HorizaError;

pub mod distributor;
pub mod emission;
pub mod epoch;
pub mod escrow;
pub mod gauge;
pub mod ledger;
pub mod node;

/// Render an engine error for the wire.
pub fn rpc_error(e: HorizaError) -> String {
    format!("{}: {}", e.code(), e)
}
