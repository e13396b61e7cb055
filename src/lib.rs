pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod mcp;
pub mod upstream;

pub use cache::{BoundedCache, SweeperHandle};
pub use config::Config;
pub use error::{OpsboardError, Result};

// Re-export aggregation types for convenience
pub use aggregate::{
    BucketWidth, HealthStatus, HealthThresholds, ServiceHealth, TimeSeriesBucket,
    UrgencyDistribution,
};

// Re-export the dashboard protocol
pub use dashboard::{
    DashboardPayload, DashboardService, DashboardSummary, LiveStats, RecentIncident, TimeRange,
};

// Re-export the upstream adapter
pub use upstream::{
    CachedAdapter, Incident, IncidentFilter, IncidentSource, IncidentStatus, Service,
    ServiceFilter, UpstreamClient, Urgency,
};

// Re-export the MCP server
pub use mcp::McpServer;
