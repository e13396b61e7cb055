//! JSON-RPC request handlers for the MCP protocol methods.

use crate::dashboard::{DashboardService, TimeRange};
use crate::error::Result;
use crate::mcp::tools::{ToolRegistry, GET_INCIDENT_DASHBOARD, POLL_INCIDENT_STATS};
use crate::mcp::transport::{
    create_error_response, create_success_response, format_tool_response,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub struct McpHandlers {
    dashboard: Arc<DashboardService>,
}

impl McpHandlers {
    pub fn new(dashboard: Arc<DashboardService>) -> Self {
        Self { dashboard }
    }

    /// Dispatch a single JSON-RPC request to the matching handler.
    pub async fn handle_request(
        &self,
        method: &str,
        params: Option<&Value>,
        id: Option<&Value>,
    ) -> Value {
        debug!(method, "handling MCP request");
        match method {
            "initialize" => create_success_response(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": "opsboard",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => create_success_response(id, json!({})),
            "tools/list" => create_success_response(id, ToolRegistry::tools_list()),
            "tools/call" => self.handle_tool_call(params, id).await,
            _ => create_error_response(id, -32601, "Method not found"),
        }
    }

    async fn handle_tool_call(&self, params: Option<&Value>, id: Option<&Value>) -> Value {
        let Some(params) = params else {
            return create_error_response(id, -32602, "Missing params");
        };
        let Some(name) = params.get("name").and_then(|n| n.as_str()) else {
            return create_error_response(id, -32602, "Missing tool name");
        };
        if !ToolRegistry::is_known_tool(name) {
            return create_error_response(id, -32601, &format!("Unknown tool: {name}"));
        }
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let outcome = match name {
            GET_INCIDENT_DASHBOARD => self.get_incident_dashboard(&arguments).await,
            POLL_INCIDENT_STATS => self.poll_incident_stats().await,
            _ => unreachable!("tool names are validated above"),
        };

        // Failures are converted to an error-flagged payload inside a
        // successful JSON-RPC response, so the UI can render a retry
        // affordance instead of crashing.
        let text = match outcome {
            Ok(value) => value.to_string(),
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                json!({
                    "error": true,
                    "retryable": e.is_retryable(),
                    "message": e.to_string()
                })
                .to_string()
            }
        };
        create_success_response(id, format_tool_response(&text))
    }

    async fn get_incident_dashboard(&self, arguments: &Value) -> Result<Value> {
        let label = arguments
            .get("timeRange")
            .and_then(|v| v.as_str())
            .unwrap_or("24h");
        let range = TimeRange::parse(label)?;
        let payload = self.dashboard.full_fetch(range).await?;

        let mut value = serde_json::to_value(&payload)?;
        value["summary_text"] = Value::String(payload.summary_line());
        Ok(value)
    }

    async fn poll_incident_stats(&self) -> Result<Value> {
        let stats = self.dashboard.live_poll().await?;
        Ok(serde_json::to_value(&stats)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpsboardError;
    use crate::upstream::{Incident, IncidentFilter, IncidentSource, Service, ServiceFilter};
    use async_trait::async_trait;

    struct EmptySource;

    #[async_trait]
    impl IncidentSource for EmptySource {
        async fn list_incidents(
            &self,
            _filter: &IncidentFilter,
        ) -> crate::error::Result<Vec<Incident>> {
            Ok(Vec::new())
        }
        async fn list_services(
            &self,
            _filter: &ServiceFilter,
        ) -> crate::error::Result<Vec<Service>> {
            Ok(Vec::new())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl IncidentSource for FailingSource {
        async fn list_incidents(
            &self,
            _filter: &IncidentFilter,
        ) -> crate::error::Result<Vec<Incident>> {
            Err(OpsboardError::UpstreamTransient {
                status: 503,
                message: "upstream down".to_string(),
            })
        }
        async fn list_services(
            &self,
            _filter: &ServiceFilter,
        ) -> crate::error::Result<Vec<Service>> {
            Ok(Vec::new())
        }
    }

    fn handlers_with(source: impl IncidentSource + 'static) -> McpHandlers {
        McpHandlers::new(Arc::new(DashboardService::new(Arc::new(source))))
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let handlers = handlers_with(EmptySource);
        let id = json!(1);
        let response = handlers
            .handle_request("resources/list", None, Some(&id))
            .await;
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn initialize_reports_tool_capability() {
        let handlers = handlers_with(EmptySource);
        let id = json!(1);
        let response = handlers.handle_request("initialize", None, Some(&id)).await;
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tool_call_without_params_is_invalid() {
        let handlers = handlers_with(EmptySource);
        let id = json!(2);
        let response = handlers.handle_request("tools/call", None, Some(&id)).await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let handlers = handlers_with(EmptySource);
        let id = json!(3);
        let params = json!({"name": "acknowledge-incident", "arguments": {}});
        let response = handlers
            .handle_request("tools/call", Some(&params), Some(&id))
            .await;
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_flagged_payload() {
        let handlers = handlers_with(FailingSource);
        let id = json!(4);
        let params = json!({"name": "poll-incident-stats"});
        let response = handlers
            .handle_request("tools/call", Some(&params), Some(&id))
            .await;

        // JSON-RPC level success; the error is flagged inside the payload.
        assert!(response.get("error").is_none());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"], true);
        assert_eq!(payload["retryable"], true);
        assert!(payload["message"].as_str().unwrap().contains("503"));
    }
}
