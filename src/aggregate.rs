//! Pure snapshot aggregation.
//!
//! Every function here is stateless and synchronous: the same snapshot always
//! produces the same output, with no clock or randomness involved, so calls
//! are trivially safe to make from multiple in-flight requests.

use crate::upstream::{Incident, IncidentStatus, Service, Urgency};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Width of a timeline bucket, selected by the requested time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    Hour,
    Day,
}

impl BucketWidth {
    fn seconds(&self) -> i64 {
        match self {
            BucketWidth::Hour => 3_600,
            BucketWidth::Day => 86_400,
        }
    }

    /// Truncate a timestamp down to the containing bucket boundary.
    pub fn floor(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let ts = t.timestamp();
        let floored = ts - ts.rem_euclid(self.seconds());
        DateTime::from_timestamp(floored, 0).unwrap_or(t)
    }
}

/// Fixed-width time window with per-status incident counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesBucket {
    pub start: DateTime<Utc>,
    pub triggered: usize,
    pub acknowledged: usize,
    pub resolved: usize,
    pub total: usize,
}

/// Bucket incidents by `created_at`, floored to the bucket boundary.
///
/// Only buckets containing at least one incident appear (no zero-filling);
/// output is sorted ascending by bucket start.
pub fn build_timeline(incidents: &[Incident], width: BucketWidth) -> Vec<TimeSeriesBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, TimeSeriesBucket> = BTreeMap::new();

    for incident in incidents {
        let start = width.floor(incident.created_at);
        let bucket = buckets.entry(start).or_insert_with(|| TimeSeriesBucket {
            start,
            triggered: 0,
            acknowledged: 0,
            resolved: 0,
            total: 0,
        });
        match incident.status {
            IncidentStatus::Triggered => bucket.triggered += 1,
            IncidentStatus::Acknowledged => bucket.acknowledged += 1,
            IncidentStatus::Resolved => bucket.resolved += 1,
        }
        bucket.total += 1;
    }

    buckets.into_values().collect()
}

/// Derived per-service status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Named classification thresholds.
///
/// Status is a pure function of incident count: at most `healthy_max` is
/// healthy, at most `warning_max` is warning, anything above is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    pub healthy_max: usize,
    pub warning_max: usize,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy_max: 2,
            warning_max: 5,
        }
    }
}

impl HealthThresholds {
    pub fn classify(&self, incident_count: usize) -> HealthStatus {
        if incident_count <= self.healthy_max {
            HealthStatus::Healthy
        } else if incident_count <= self.warning_max {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }
}

/// Per-service incident rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub service_id: String,
    pub service_name: String,
    pub incident_count: usize,
    pub high_urgency: usize,
    pub low_urgency: usize,
    /// Mean resolution time over resolved incidents; `None` when the service
    /// has no resolved incidents, never zero.
    pub avg_resolution_minutes: Option<f64>,
    pub status: HealthStatus,
}

/// Group incidents by owning service and classify each service.
///
/// Display names come from the service catalog, falling back to the incident's
/// own service summary. Rows are sorted descending by incident count; ties
/// keep snapshot encounter order (the sort is stable). Services with zero
/// incidents do not appear; seeding the catalog into the rollup is the
/// dashboard layer's policy, not the aggregator's.
pub fn service_health(
    incidents: &[Incident],
    services: &[Service],
    thresholds: &HealthThresholds,
) -> Vec<ServiceHealth> {
    let catalog: HashMap<&str, &str> = services
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    struct Rollup {
        name: String,
        count: usize,
        high: usize,
        low: usize,
        resolution_minutes: Vec<f64>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut rollups: HashMap<String, Rollup> = HashMap::new();

    for incident in incidents {
        let service_id = incident.service.id.clone();
        let rollup = rollups.entry(service_id.clone()).or_insert_with(|| {
            order.push(service_id.clone());
            let name = catalog
                .get(service_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| {
                    if incident.service.summary.is_empty() {
                        service_id.clone()
                    } else {
                        incident.service.summary.clone()
                    }
                });
            Rollup {
                name,
                count: 0,
                high: 0,
                low: 0,
                resolution_minutes: Vec::new(),
            }
        });

        rollup.count += 1;
        match incident.urgency {
            Urgency::High => rollup.high += 1,
            Urgency::Low => rollup.low += 1,
        }
        if incident.status == IncidentStatus::Resolved {
            if let Some(resolved_at) = incident.resolved_at {
                let minutes = (resolved_at - incident.created_at).num_seconds() as f64 / 60.0;
                rollup.resolution_minutes.push(minutes);
            }
        }
    }

    let mut rows: Vec<ServiceHealth> = order
        .into_iter()
        .filter_map(|id| rollups.remove(&id).map(|r| (id, r)))
        .map(|(id, rollup)| {
            let avg = if rollup.resolution_minutes.is_empty() {
                None
            } else {
                Some(
                    rollup.resolution_minutes.iter().sum::<f64>()
                        / rollup.resolution_minutes.len() as f64,
                )
            };
            ServiceHealth {
                status: thresholds.classify(rollup.count),
                service_id: id,
                service_name: rollup.name,
                incident_count: rollup.count,
                high_urgency: rollup.high,
                low_urgency: rollup.low,
                avg_resolution_minutes: avg,
            }
        })
        .collect();

    // Stable sort keeps encounter order for equal counts.
    rows.sort_by(|a, b| b.incident_count.cmp(&a.incident_count));
    rows
}

/// High/low counts with integer percentages over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrgencyDistribution {
    pub high: usize,
    pub low: usize,
    pub total: usize,
    pub high_percent: u32,
    pub low_percent: u32,
}

/// Percentages are rounded to the nearest integer and both zero when the
/// snapshot is empty.
pub fn urgency_distribution(incidents: &[Incident]) -> UrgencyDistribution {
    let total = incidents.len();
    let high = incidents
        .iter()
        .filter(|i| i.urgency == Urgency::High)
        .count();
    let low = total - high;

    let (high_percent, low_percent) = if total == 0 {
        (0, 0)
    } else {
        (
            (high as f64 * 100.0 / total as f64).round() as u32,
            (low as f64 * 100.0 / total as f64).round() as u32,
        )
    };

    UrgencyDistribution {
        high,
        low,
        total,
        high_percent,
        low_percent,
    }
}

/// Arithmetic mean of `(resolved_at - created_at)` in minutes over resolved
/// incidents; `None` when the snapshot has no resolved incidents.
pub fn mean_time_to_resolution(incidents: &[Incident]) -> Option<f64> {
    let durations: Vec<f64> = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Resolved)
        .filter_map(|i| {
            i.resolved_at
                .map(|resolved| (resolved - i.created_at).num_seconds() as f64 / 60.0)
        })
        .collect();

    if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    }
}
