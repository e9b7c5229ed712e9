// crates/horiza-rpc/src/middleware.rs
//
// Request interceptor for the RPC server.

use tonic::{Request, Status};

/// Log each incoming request's peer address and user agent.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let user_agent = req
        .metadata()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::debug!(
        remote = ?req.remote_addr(),
        user_agent,
        "Incoming RPC request"
    );
    Ok(req)
}
