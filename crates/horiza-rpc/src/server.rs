// crates/horiza-rpc/src/server.rs
//
// RPC server setup: HorizaRpcServer and RpcConfig.
//
// A single tonic service accepts a JSON-encoded request with a method field,
// dispatches it to the matching handler, and returns a JSON-encoded
// response. No proto codegen; tonic supplies the HTTP transport and the
// interceptor chain.

use std::future::Future;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;

use crate::engine::{system_time, EngineHandle, TimeSource};
use crate::handlers;
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50061,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "escrow/lock", "gauge/vote").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    /// "<Code>: <message>" for engine errors.
    pub error: Option<String>,
}

impl JsonRpcResponse {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// HorizaRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the Horiza Protocol.
#[derive(Clone)]
pub struct HorizaRpcServer {
    config: RpcConfig,
    engine: EngineHandle,
    clock: TimeSource,
    start_time: Option<Instant>,
}

impl std::fmt::Debug for HorizaRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizaRpcServer")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish()
    }
}

impl HorizaRpcServer {
    pub fn new(config: RpcConfig, engine: EngineHandle) -> Self {
        Self {
            config,
            engine,
            clock: system_time(),
            start_time: None,
        }
    }

    /// Replace the wall clock used for epoch and emission calls.
    pub fn with_clock(mut self, clock: TimeSource) -> Self {
        self.clock = clock;
        self
    }

    /// Set the daemon start time for uptime calculation.
    pub fn with_start_time(mut self, start_time: Instant) -> Self {
        self.start_time = Some(start_time);
        self
    }

    fn service(&self) -> HorizaServiceImpl {
        HorizaServiceImpl {
            engine: self.engine.clone(),
            clock: self.clock.clone(),
            start_time: self.start_time,
        }
    }

    /// Dispatch one request in-process, bypassing the transport.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.service().dispatch(request).await
    }

    /// Serve until the process is terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start_with_shutdown<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Horiza RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                HorizaJsonRpcServer::new(self.service()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, shutdown)
            .await?;

        tracing::info!("Horiza RPC server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct HorizaServiceImpl {
    engine: EngineHandle,
    clock: TimeSource,
    start_time: Option<Instant>,
}

impl HorizaServiceImpl {
    /// Dispatch a JSON-RPC request to the handler named by its method.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let engine = &self.engine;
        let clock = &self.clock;
        let params = request.params;

        let result = match request.method.as_str() {
            // Escrow
            "escrow/lock" => {
                dispatch_handler(params, |r| handlers::escrow::handle_lock(engine, r)).await
            }
            "escrow/increase" => {
                dispatch_handler(params, |r| handlers::escrow::handle_increase(engine, r)).await
            }
            "escrow/extend" => {
                dispatch_handler(params, |r| handlers::escrow::handle_extend(engine, r)).await
            }
            "escrow/merge" => {
                dispatch_handler(params, |r| handlers::escrow::handle_merge(engine, r)).await
            }
            "escrow/unlock" => {
                dispatch_handler(params, |r| handlers::escrow::handle_unlock(engine, r)).await
            }
            "escrow/transfer" => {
                dispatch_handler(params, |r| handlers::escrow::handle_transfer(engine, r)).await
            }
            "escrow/lock_info" => {
                dispatch_handler(params, |r| handlers::escrow::handle_lock_info(engine, r)).await
            }
            "escrow/locks_of" => {
                dispatch_handler(params, |r| handlers::escrow::handle_locks_of(engine, r)).await
            }
            "escrow/holders" => {
                dispatch_handler(params, |r| handlers::escrow::handle_holders(engine, r)).await
            }
            "escrow/snapshot" => {
                dispatch_handler(params, |r| handlers::escrow::handle_snapshot(engine, r)).await
            }

            // Gauges
            "gauge/create" => {
                dispatch_handler(params, |r| handlers::gauge::handle_create_gauge(engine, r)).await
            }
            "gauge/vote" => {
                dispatch_handler(params, |r| handlers::gauge::handle_vote(engine, r)).await
            }
            "gauge/list" => {
                dispatch_handler(params, |r| handlers::gauge::handle_list_gauges(engine, r)).await
            }
            "gauge/tallies" => {
                dispatch_handler(params, |r| handlers::gauge::handle_tallies(engine, r)).await
            }

            // Epochs
            "epoch/status" => {
                dispatch_handler(params, |r| {
                    handlers::epoch::handle_epoch_status(engine, clock, r)
                })
                .await
            }
            "epoch/update" => {
                dispatch_handler(params, |r| {
                    handlers::epoch::handle_update_epoch(engine, clock, r)
                })
                .await
            }

            // Emission
            "emission/distribute" => {
                dispatch_handler(params, |r| {
                    handlers::emission::handle_distribute(engine, clock, r)
                })
                .await
            }
            "emission/status" => {
                dispatch_handler(params, |r| {
                    handlers::emission::handle_emission_status(engine, r)
                })
                .await
            }

            // Holder rewards
            "distributor/update_root" => {
                dispatch_handler(params, |r| {
                    handlers::distributor::handle_update_root(engine, r)
                })
                .await
            }
            "distributor/claim" => {
                dispatch_handler(params, |r| handlers::distributor::handle_claim(engine, r)).await
            }

            // Ledger
            "ledger/balance" => {
                dispatch_handler(params, |r| handlers::ledger::handle_get_balance(engine, r)).await
            }

            // Node
            "node/health" => {
                let start_time = self.start_time;
                dispatch_handler(params, |r| {
                    handlers::node::handle_get_health(engine, start_time, r)
                })
                .await
            }

            _ => Err(format!("Unknown method: {}", request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(value),
            Err(err) => {
                tracing::debug!(method = %request.method, error = %err, "RPC request failed");
                JsonRpcResponse::failure(err)
            }
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, String>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, String>>,
{
    // Parameterless methods accept an omitted or null params field.
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| format!("InvalidInput: failed to deserialize request: {}", e))?;
    let response = handler(request).await?;
    serde_json::to_value(response)
        .map_err(|e| format!("Serialization: failed to serialize response: {}", e))
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// tonic service carrying JSON-RPC envelopes over HTTP POST.
#[derive(Clone)]
pub struct HorizaJsonRpcServer {
    inner: HorizaServiceImpl,
}

impl HorizaJsonRpcServer {
    fn new(inner: HorizaServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for HorizaJsonRpcServer {
    const NAME: &'static str = "horiza.rpc.HorizaService";
}

impl<B> tower_service::Service<http::Request<B>> for HorizaJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future =
        std::pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            if req.method() != http::Method::POST {
                return Ok(json_response(&JsonRpcResponse::failure(format!(
                    "Unsupported HTTP method {}; send JSON-RPC requests with POST",
                    req.method()
                ))));
            }

            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: Box<dyn std::error::Error + Send + Sync> = e.into();
                    tracing::warn!("Failed to read request body: {}", e);
                    return Ok(json_response(&JsonRpcResponse::failure(format!(
                        "Failed to read request body: {}",
                        e
                    ))));
                }
            };

            let response = match serde_json::from_slice::<JsonRpcRequest>(&body) {
                Ok(request) => inner.dispatch(request).await,
                Err(e) => JsonRpcResponse::failure(format!("Invalid JSON-RPC request: {}", e)),
            };
            Ok(json_response(&response))
        })
    }
}

/// HTTP 200 carrying a serialized envelope. Method-level failures travel in
/// the envelope, not the status code.
fn json_response(envelope: &JsonRpcResponse) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json)).map_err(|never| match never {}),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
