//! MCP server wiring and lifecycle.
//!
//! Composes the upstream client, bounded cache, aggregator and dashboard
//! protocol behind a stdio JSON-RPC transport. The cache sweeper starts with
//! the server and is stopped on shutdown.

pub mod handlers;
pub mod tools;
pub mod transport;

pub use handlers::McpHandlers;
pub use tools::ToolRegistry;
pub use transport::StdioTransport;

use crate::cache::{BoundedCache, SweeperHandle};
use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::upstream::{CachedAdapter, IncidentSource, UpstreamClient};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct McpServer {
    handlers: McpHandlers,
    transport: StdioTransport,
    cache: BoundedCache,
    sweep_interval: Duration,
    sweeper: Option<SweeperHandle>,
}

impl McpServer {
    /// Build the full production stack from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let cache = BoundedCache::new();
        let client = Arc::new(UpstreamClient::new(config)?);
        let adapter: Arc<dyn IncidentSource> =
            Arc::new(CachedAdapter::from_config(client, cache.clone(), config));
        let dashboard = Arc::new(DashboardService::new(adapter));

        Ok(Self {
            handlers: McpHandlers::new(dashboard),
            transport: StdioTransport::new(config.request_timeout()),
            cache,
            sweep_interval: config.sweep_interval(),
            sweeper: None,
        })
    }

    /// Run the server until stdin closes.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "starting opsboard MCP server (stdio, protocol {})",
            handlers::PROTOCOL_VERSION
        );
        self.sweeper = Some(self.cache.spawn_sweeper(self.sweep_interval));

        let result = self.transport.run(&self.handlers).await;
        self.shutdown();
        result
    }

    /// Stop background housekeeping.
    pub fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.stop();
        }
        info!("opsboard MCP server stopped");
    }
}
