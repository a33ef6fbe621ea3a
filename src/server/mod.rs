//! Stdio transport: newline-delimited JSON-RPC in, JSON-RPC out.
//!
//! Requests are handled one at a time, in arrival order. Only `tools/list`
//! and `tools/call` reach the dispatcher; the rest is handshake plumbing.

pub mod protocol;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::tools::Dispatcher;
use protocol::{
    error_codes, CallToolParams, CallToolResult, InitializeParams, InitializeResult,
    ListToolsResult, RpcRequest, RpcResponse, ServerInfo, DEFAULT_PROTOCOL_VERSION,
};

pub struct McpServer {
    dispatcher: Dispatcher,
    info: ServerConfig,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher, info: ServerConfig) -> Self {
        Self { dispatcher, info }
    }

    /// Read requests from `reader` until EOF, writing one response line per
    /// request to `writer`. Notifications get no reply. Lines that are not
    /// valid UTF-8 get a parse error and the loop keeps reading.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read request")?;
            if n == 0 {
                break;
            }

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_message(line.trim_end()).await,
                Err(e) => {
                    warn!(error = %e, "Message is not valid UTF-8");
                    Some(RpcResponse::error(
                        Value::Null,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {e}"),
                    ))
                }
            };

            if let Some(resp) = reply {
                let mut out = serde_json::to_string(&resp).context("Failed to encode response")?;
                out.push('\n');
                writer
                    .write_all(out.as_bytes())
                    .await
                    .context("Failed to write response")?;
                writer.flush().await.context("Failed to flush response")?;
            }
        }
        info!("Input closed, stopping server");
        Ok(())
    }

    /// Handle one raw message line.
    pub async fn handle_message(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                return Some(RpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        let request: RpcRequest = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                return Some(RpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ));
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "Request");

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification ignored");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&ListToolsResult {
                tools: self.dispatcher.list_tools(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => Err((error_codes::METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err((code, message)) => RpcResponse::error(id, code, message),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, (i64, String)> {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        let protocol_version = params
            .protocol_version
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        info!(%protocol_version, "Client initialized");

        to_value(&InitializeResult {
            protocol_version,
            capabilities: json!({"tools": {}}),
            server_info: ServerInfo {
                name: self.info.name.clone(),
                version: self.info.version.clone(),
            },
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, (i64, String)> {
        let params: CallToolParams = params
            .ok_or_else(|| "missing params".to_string())
            .and_then(|p| serde_json::from_value(p).map_err(|e| e.to_string()))
            .map_err(|e| (error_codes::INVALID_PARAMS, format!("Invalid params: {e}")))?;

        let content = self
            .dispatcher
            .call_tool(&params.name, params.arguments.as_ref())
            .await;

        to_value(&CallToolResult {
            content,
            is_error: false,
        })
    }
}

fn to_value<T: Serialize>(v: &T) -> Result<Value, (i64, String)> {
    serde_json::to_value(v).map_err(|e| (error_codes::INTERNAL_ERROR, e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockNewsSource;
    use crate::platforms::MockMarketSource;
    use std::sync::Arc;

    fn server() -> McpServer {
        let dispatcher =
            Dispatcher::new(Arc::new(MockMarketSource::new()), Arc::new(MockNewsSource::new()));
        McpServer::new(dispatcher, ServerConfig::default())
    }

    #[tokio::test]
    async fn test_parse_error() {
        let resp = server().handle_message("{nope").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let resp = server().handle_message(r#"{"jsonrpc":"2.0","id":4}"#).await.unwrap();
        assert_eq!(resp.id, json!(4));
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_notification_gets_no_reply() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let resp = server()
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{}}}"#,
            )
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "polymarket_predictions");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_call_without_name_is_invalid_params() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_successful_envelope() {
        let resp = server()
            .handle_message(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"not-a-tool","arguments":{}}}"#,
            )
            .await
            .unwrap();
        assert!(!resp.is_error());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "Unknown tool: not-a-tool");
    }
}
