//! Tool definitions and schemas exposed through the MCP protocol.

use serde_json::{json, Value};

pub const GET_INCIDENT_DASHBOARD: &str = "get-incident-dashboard";
pub const POLL_INCIDENT_STATS: &str = "poll-incident-stats";

/// Static registry of the dashboard tools.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Tool list returned by `tools/list`. Both tools are read-only and
    /// idempotent; the heavy/cheap split is the point of the protocol.
    pub fn tools_list() -> Value {
        json!({
            "tools": [
                {
                    "name": GET_INCIDENT_DASHBOARD,
                    "description": "Full dashboard refresh: time-series buckets, per-service health, urgency distribution and summary counters for the requested window",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "timeRange": {
                                "type": "string",
                                "enum": ["24h", "7d", "30d"],
                                "default": "24h",
                                "description": "Window ending now. 24h uses hourly buckets, 7d and 30d use daily buckets"
                            }
                        },
                        "required": []
                    },
                    "annotations": {
                        "readOnlyHint": true,
                        "destructiveHint": false,
                        "idempotentHint": true
                    }
                },
                {
                    "name": POLL_INCIDENT_STATS,
                    "description": "Lightweight live poll: counts for currently-active incidents and the 5 most recent, intended to be called on a fixed interval",
                    "inputSchema": {
                        "type": "object",
                        "properties": {},
                        "required": []
                    },
                    "annotations": {
                        "readOnlyHint": true,
                        "destructiveHint": false,
                        "idempotentHint": true
                    }
                }
            ]
        })
    }

    pub fn is_known_tool(name: &str) -> bool {
        matches!(name, GET_INCIDENT_DASHBOARD | POLL_INCIDENT_STATS)
    }
}
