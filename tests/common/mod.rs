//! Shared builders and mock sources for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsboard::error::{OpsboardError, Result};
use opsboard::upstream::{
    Incident, IncidentFilter, IncidentSource, IncidentStatus, Service, ServiceFilter, ServiceRef,
    Urgency,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn incident(
    id: &str,
    number: u64,
    service: &str,
    status: IncidentStatus,
    urgency: Urgency,
    created_at: &str,
    resolved_at: Option<&str>,
) -> Incident {
    Incident {
        id: id.to_string(),
        incident_number: number,
        title: format!("Incident {number}"),
        status,
        urgency,
        created_at: created_at.parse::<DateTime<Utc>>().unwrap(),
        resolved_at: resolved_at.map(|t| t.parse::<DateTime<Utc>>().unwrap()),
        service: ServiceRef {
            id: service.to_string(),
            summary: format!("{service} service"),
        },
    }
}

pub fn service(id: &str, name: &str) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        teams: vec![],
    }
}

/// Mock source serving fixed snapshots and counting upstream calls.
pub struct StaticSource {
    pub incidents: Vec<Incident>,
    pub services: Vec<Service>,
    pub incident_calls: Arc<AtomicUsize>,
    pub service_calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(incidents: Vec<Incident>, services: Vec<Service>) -> Self {
        Self {
            incidents,
            services,
            incident_calls: Arc::new(AtomicUsize::new(0)),
            service_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl IncidentSource for StaticSource {
    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>> {
        self.incident_calls.fetch_add(1, Ordering::SeqCst);
        // Honor the status and window dimensions the way upstream would.
        Ok(self
            .incidents
            .iter()
            .filter(|i| filter.statuses.is_empty() || filter.statuses.contains(&i.status))
            .filter(|i| filter.since.map_or(true, |since| i.created_at >= since))
            .filter(|i| filter.until.map_or(true, |until| i.created_at < until))
            .cloned()
            .collect())
    }

    async fn list_services(&self, _filter: &ServiceFilter) -> Result<Vec<Service>> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.services.clone())
    }
}

/// Mock source that always fails with a transient upstream error.
pub struct FailingSource;

#[async_trait]
impl IncidentSource for FailingSource {
    async fn list_incidents(&self, _filter: &IncidentFilter) -> Result<Vec<Incident>> {
        Err(OpsboardError::UpstreamTransient {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }

    async fn list_services(&self, _filter: &ServiceFilter) -> Result<Vec<Service>> {
        Err(OpsboardError::UpstreamTransient {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }
}
