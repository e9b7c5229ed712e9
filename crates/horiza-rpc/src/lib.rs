// crates/horiza-rpc/src/lib.rs
//
// horiza-rpc: engine actor and JSON-RPC server for the Horiza Protocol.
//
// The protocol engine lives on a single task (`EngineHandle`); every RPC
// handler and the daemon's epoch scheduler talk to it by message. The
// server speaks JSON-RPC over tonic's HTTP transport without proto codegen.

pub mod engine;
pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main types for ergonomic access.
pub use engine::{system_time, Engine, EngineHandle, TimeSource};
pub use server::{HorizaRpcServer, JsonRpcRequest, JsonRpcResponse, RpcConfig};
