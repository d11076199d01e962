//! JSON-RPC execution channel over HTTP.

use crate::channel::{revert_reason, CallRequest, ChannelResponse, ExecutionChannel};
use crate::error::ChannelError;
use crate::types::BlockId;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// `ExecutionChannel` backed by a JSON-RPC HTTP endpoint.
pub struct HttpChannel {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpChannel {
    pub fn new(url: impl Into<String>) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, JsonRpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(JsonRpcFailure::Channel(ChannelError::Http(format!(
                "Request failed with status {}",
                status
            ))));
        }

        let parsed: JsonRpcResponse = response.json().await.map_err(|e| {
            JsonRpcFailure::Channel(ChannelError::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        if let Some(error) = parsed.error {
            return Err(JsonRpcFailure::Rpc(error));
        }

        parsed.result.ok_or_else(|| {
            JsonRpcFailure::Channel(ChannelError::InvalidResponse(
                "Response carries neither result nor error".to_string(),
            ))
        })
    }
}

/// Intermediate failure form: RPC-level errors still need revert classification.
enum JsonRpcFailure {
    Channel(ChannelError),
    Rpc(JsonRpcError),
}

fn map_http_error(error: reqwest::Error) -> JsonRpcFailure {
    let rendered = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    JsonRpcFailure::Channel(ChannelError::Http(rendered))
}

/// Classify a JSON-RPC `eth_call` error as a revert or a transport failure.
///
/// `code == 3` is the EIP-1474 execution-error code; some nodes only say
/// "execution reverted" in the message. The revert payload rides in `data`
/// as a hex string, either directly or nested one level.
fn classify_rpc_error(error: JsonRpcError) -> Result<ChannelResponse, ChannelError> {
    let message_lower = error.message.to_ascii_lowercase();
    let is_revert = error.code == 3 || message_lower.contains("revert");
    if !is_revert {
        return Err(ChannelError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let data = revert_payload(error.data.as_ref()).unwrap_or_default();
    let reason = revert_reason(&data).or_else(|| {
        error
            .message
            .split_once("execution reverted:")
            .map(|(_, suffix)| suffix.trim().to_string())
            .filter(|s| !s.is_empty())
    });

    Ok(ChannelResponse::Revert { data, reason })
}

fn revert_payload(data: Option<&Value>) -> Option<Bytes> {
    let raw = match data? {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    Bytes::from_str(raw).ok()
}

fn parse_quantity(value: &Value) -> Result<u64, ChannelError> {
    let raw = value.as_str().ok_or_else(|| {
        ChannelError::InvalidResponse(format!("Expected hex quantity, got {}", value))
    })?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChannelError::InvalidResponse(format!("Invalid hex quantity {}: {}", raw, e)))
}

#[async_trait]
impl ExecutionChannel for HttpChannel {
    async fn call(
        &self,
        request: &CallRequest,
        block: &BlockId,
    ) -> Result<ChannelResponse, ChannelError> {
        let mut call_object = json!({
            "to": request.to.to_string(),
            "data": request.data.to_string(),
        });
        if let Some(from) = request.from {
            call_object["from"] = json!(from.to_string());
        }
        if let Some(gas) = request.gas {
            call_object["gas"] = json!(format!("0x{:x}", gas));
        }
        if let Some(gas_price) = request.gas_price {
            call_object["gasPrice"] = json!(format!("0x{:x}", gas_price));
        }

        match self
            .request("eth_call", json!([call_object, block.to_string()]))
            .await
        {
            Ok(result) => {
                let raw = result.as_str().ok_or_else(|| {
                    ChannelError::InvalidResponse(format!("Expected hex bytes, got {}", result))
                })?;
                let bytes = Bytes::from_str(raw).map_err(|e| {
                    ChannelError::InvalidResponse(format!("Invalid hex bytes: {}", e))
                })?;
                Ok(ChannelResponse::Success(bytes))
            }
            Err(JsonRpcFailure::Rpc(error)) => classify_rpc_error(error),
            Err(JsonRpcFailure::Channel(error)) => Err(error),
        }
    }

    async fn chain_id(&self) -> Result<u64, ChannelError> {
        match self.request("eth_chainId", json!([])).await {
            Ok(result) => parse_quantity(&result),
            Err(JsonRpcFailure::Rpc(error)) => Err(ChannelError::Rpc {
                code: error.code,
                message: error.message,
            }),
            Err(JsonRpcFailure::Channel(error)) => Err(error),
        }
    }
}
