// crates/horiza-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the horiza-daemon HTTP endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mirrors the server's JsonRpcRequest envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    pub params: serde_json::Value,
}

/// Mirrors the server's JsonRpcResponse envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Could not reach daemon at {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The daemon answered with `success: false`.
    #[error("{method} failed: {message}")]
    Remote { method: String, message: String },

    #[error("Unexpected response to {method}: {message}")]
    Decode { method: String, message: String },
}

/// Send a JSON-RPC call to the daemon and return the parsed response.
pub async fn rpc_call(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<JsonRpcResponse, RpcError> {
    let request = JsonRpcRequest {
        method: method.to_string(),
        params,
    };
    let transport = |source: reqwest::Error| RpcError::Transport {
        endpoint: endpoint.to_string(),
        source,
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(transport)?;

    let rpc_response: JsonRpcResponse = resp.json().await.map_err(transport)?;
    Ok(rpc_response)
}

/// Call `method` and decode its result into `T`.
pub async fn call<T: DeserializeOwned>(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<T, RpcError> {
    let response = rpc_call(endpoint, method, params).await?;
    decode(method, response)
}

fn decode<T: DeserializeOwned>(method: &str, response: JsonRpcResponse) -> Result<T, RpcError> {
    if !response.success {
        return Err(RpcError::Remote {
            method: method.to_string(),
            message: response
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    serde_json::from_value(response.result.unwrap_or_default()).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        message: e.to_string(),
    })
}
