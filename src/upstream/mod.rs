//! Upstream adapter: the only component that performs network I/O.
//!
//! `UpstreamClient` talks to the paginated REST API and fully drains
//! pagination; `CachedAdapter` layers the bounded cache in front of any
//! `IncidentSource` so callers see snapshot semantics with staleness bounds.

pub mod client;
pub mod models;

pub use client::{CachedAdapter, UpstreamClient};
pub use models::{
    Incident, IncidentFilter, IncidentStatus, Service, ServiceFilter, ServiceRef, TeamRef, Urgency,
};

use crate::error::Result;
use async_trait::async_trait;

/// Source of incident and service snapshots.
///
/// The dashboard layer depends on this seam rather than on the concrete HTTP
/// client, which keeps aggregation testable without a network.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>>;
    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<Service>>;
}
