//! Typed wire model for the upstream ticketing API.
//!
//! Status and urgency are closed enums: a payload carrying an unrecognized
//! variant fails deserialization at the adapter boundary instead of being
//! silently miscounted downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

impl IncidentStatus {
    /// Triggered and acknowledged incidents are "active" for polling.
    pub fn is_active(&self) -> bool {
        !matches!(self, IncidentStatus::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Triggered => "triggered",
            IncidentStatus::Acknowledged => "acknowledged",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

/// Binary severity assigned by the upstream system (distinct from the
/// multi-level "priority" concept elsewhere in the product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Low => "low",
        }
    }
}

/// Reference to the service owning an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

/// A single incident record, immutable from this subsystem's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub incident_number: u64,
    pub title: String,
    pub status: IncidentStatus,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub service: ServiceRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

/// Slowly-changing service reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub teams: Vec<TeamRef>,
}

/// Paginated incident collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct IncidentPage {
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub more: bool,
}

/// Paginated service collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ServicePage {
    pub services: Vec<Service>,
    #[serde(default)]
    pub more: bool,
}

/// Filter for incident listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub statuses: Vec<IncidentStatus>,
    pub urgencies: Vec<Urgency>,
    pub service_ids: Vec<String>,
    pub team_ids: Vec<String>,
}

impl IncidentFilter {
    /// Incidents created within `[since, until)`, any status.
    pub fn window(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            ..Self::default()
        }
    }

    /// Currently-active incidents only (triggered or acknowledged).
    pub fn active() -> Self {
        Self {
            statuses: vec![IncidentStatus::Triggered, IncidentStatus::Acknowledged],
            ..Self::default()
        }
    }

    /// Stable cache key covering every filter dimension.
    pub fn cache_key(&self) -> String {
        let statuses: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
        let urgencies: Vec<&str> = self.urgencies.iter().map(|u| u.as_str()).collect();
        format!(
            "incidents:since={}|until={}|statuses={}|urgencies={}|services={}|teams={}",
            self.since.map(|t| t.to_rfc3339()).unwrap_or_default(),
            self.until.map(|t| t.to_rfc3339()).unwrap_or_default(),
            statuses.join(","),
            urgencies.join(","),
            self.service_ids.join(","),
            self.team_ids.join(","),
        )
    }

    pub(crate) fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(since) = self.since {
            params.push(("since".to_string(), since.to_rfc3339()));
        }
        if let Some(until) = self.until {
            params.push(("until".to_string(), until.to_rfc3339()));
        }
        for status in &self.statuses {
            params.push(("statuses[]".to_string(), status.as_str().to_string()));
        }
        for urgency in &self.urgencies {
            params.push(("urgencies[]".to_string(), urgency.as_str().to_string()));
        }
        for id in &self.service_ids {
            params.push(("service_ids[]".to_string(), id.clone()));
        }
        for id in &self.team_ids {
            params.push(("team_ids[]".to_string(), id.clone()));
        }
        params
    }
}

/// Filter for service listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub team_ids: Vec<String>,
    pub query: Option<String>,
}

impl ServiceFilter {
    pub fn cache_key(&self) -> String {
        format!(
            "services:teams={}|query={}",
            self.team_ids.join(","),
            self.query.as_deref().unwrap_or_default(),
        )
    }

    pub(crate) fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for id in &self.team_ids {
            params.push(("team_ids[]".to_string(), id.clone()));
        }
        if let Some(query) = &self.query {
            params.push(("query".to_string(), query.clone()));
        }
        params
    }
}
