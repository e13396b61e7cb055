//! Stdio transport for the MCP protocol.
//!
//! Handles line-delimited JSON-RPC messages over standard input/output. The
//! polling client drives the protocol; this layer only parses, dispatches and
//! answers.

use crate::mcp::handlers::McpHandlers;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

pub struct StdioTransport {
    request_timeout: Duration,
}

impl StdioTransport {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Read requests from stdin until EOF, answering on stdout.
    pub async fn run(&self, handlers: &McpHandlers) -> Result<()> {
        debug!("starting MCP stdio transport");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("EOF on stdin, shutting down transport");
                    break;
                }
                Ok(_) => {
                    if let Err(e) = self.process_message(&line, handlers, &mut stdout).await {
                        error!("error processing message: {e}");
                    }
                }
                Err(e) => {
                    error!("IO error reading stdin: {e}");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn process_message(
        &self,
        line: &str,
        handlers: &McpHandlers,
        stdout: &mut tokio::io::Stdout,
    ) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("failed to parse JSON-RPC request: {e}");
                let response = create_error_response(None, -32700, "Parse error");
                return send_response(stdout, &response).await;
            }
        };

        let id = request.get("id");
        let method = match request.get("method").and_then(|m| m.as_str()) {
            Some(m) => m,
            None => {
                let response = create_error_response(id, -32600, "Invalid Request");
                return send_response(stdout, &response).await;
            }
        };

        // Notifications expect no response.
        if method.starts_with("notifications/") {
            debug!("received notification: {method}");
            return Ok(());
        }

        let result = tokio::time::timeout(
            self.request_timeout,
            handlers.handle_request(method, request.get("params"), id),
        )
        .await;

        let response = match result {
            Ok(resp) => resp,
            Err(_) => {
                error!("request timeout for method {method}");
                create_error_response(id, -32603, "Request timeout")
            }
        };
        send_response(stdout, &response).await
    }
}

async fn send_response(stdout: &mut tokio::io::Stdout, response: &Value) -> Result<()> {
    let serialized = serde_json::to_string(response)?;
    stdout.write_all(serialized.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

pub fn create_error_response(id: Option<&Value>, code: i32, message: &str) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn create_success_response(id: Option<&Value>, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Wrap tool output text in the MCP content envelope.
pub fn format_tool_response(text: &str) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_carries_id_and_result() {
        let id = serde_json::json!(3);
        let response = create_success_response(Some(&id), serde_json::json!({"ok": true}));
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 3);
        assert_eq!(response["result"]["ok"], true);
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let response = create_error_response(None, -32601, "Method not found");
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found");
        assert!(response["id"].is_null());
    }

    #[test]
    fn tool_response_wraps_text_content() {
        let response = format_tool_response("{\"active\":0}");
        assert_eq!(response["content"][0]["type"], "text");
        assert_eq!(response["content"][0]["text"], "{\"active\":0}");
    }
}
