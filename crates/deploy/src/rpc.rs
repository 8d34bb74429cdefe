//! JSON-RPC plumbing shared by the chain client and the node launcher.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// Timeout of a single RPC request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between two readiness checks.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Error object of a JSON-RPC response.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    message: String,
}

/// A JSON-RPC response envelope. `result` may legitimately be `null`.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// A JSON-RPC error object becomes an error carrying the node's message verbatim.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> anyhow::Result<T> {
    let request = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });

    let response: RpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("Failed to send {method} request"))?
        .json()
        .await
        .with_context(|| format!("Failed to parse {method} response"))?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error: {}", error.message);
    }

    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .with_context(|| format!("Failed to deserialize {method} result"))
}

/// Poll `check_fn` until it succeeds, or fail once `timeout_secs` have elapsed.
pub async fn wait_until_ready<F, Fut>(name: &str, timeout_secs: u64, check_fn: F) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);

    loop {
        match check_fn().await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::trace!(error = %e, service = %name, "Readiness check failed, retrying..."),
        }

        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Timeout waiting for {name} to be ready");
        }

        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_core::primitives::U64;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn test_json_rpc_call_returns_result() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).body_includes("\"method\":\"eth_chainId\"");
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x539"}));
            })
            .await;

        let client = create_client().unwrap();
        let chain_id: U64 = json_rpc_call(&client, &server.url("/"), "eth_chainId", vec![])
            .await
            .unwrap();

        assert_eq!(chain_id.to::<u64>(), 1337);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_json_rpc_call_surfaces_node_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {"code": 3, "message": "execution reverted: paused"}
                }));
            })
            .await;

        let client = create_client().unwrap();
        let err = json_rpc_call::<Value>(&client, &server.url("/"), "eth_sendTransaction", vec![])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "RPC error: execution reverted: paused");
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out() {
        let result = wait_until_ready("never", 0, || async { Err(anyhow::anyhow!("not yet")) }).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_json_rpc_call_null_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}));
            })
            .await;

        let client = create_client().unwrap();
        let receipt: Option<Value> =
            json_rpc_call(&client, &server.url("/"), "eth_getTransactionReceipt", vec![])
                .await
                .unwrap();

        assert!(receipt.is_none());
    }
}
