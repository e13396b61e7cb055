//! Dashboard session protocol: the full-fetch and live-poll operations a
//! polling UI client drives on its own timer.
//!
//! There is no internal timer here. The client owns the cadence, may pause or
//! resume it, and may re-enter the cold path at any time by requesting a
//! different time range. Both operations are idempotent within cache TTL.

use crate::aggregate::{
    build_timeline, mean_time_to_resolution, service_health, urgency_distribution, BucketWidth,
    HealthThresholds, ServiceHealth, TimeSeriesBucket, UrgencyDistribution,
};
use crate::error::{OpsboardError, Result};
use crate::upstream::{
    Incident, IncidentFilter, IncidentSource, IncidentStatus, ServiceFilter, Urgency,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Live-poll returns at most this many recent active incidents.
pub const RECENT_INCIDENT_LIMIT: usize = 5;

/// Requested dashboard window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Last24h,
    Last7d,
    Last30d,
}

impl TimeRange {
    pub fn parse(label: &str) -> Result<Self> {
        match label {
            "24h" => Ok(TimeRange::Last24h),
            "7d" => Ok(TimeRange::Last7d),
            "30d" => Ok(TimeRange::Last30d),
            other => Err(OpsboardError::InvalidArgument(format!(
                "unknown time range '{other}', expected 24h, 7d or 30d"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last24h => "24h",
            TimeRange::Last7d => "7d",
            TimeRange::Last30d => "30d",
        }
    }

    pub fn duration(&self) -> ChronoDuration {
        match self {
            TimeRange::Last24h => ChronoDuration::hours(24),
            TimeRange::Last7d => ChronoDuration::days(7),
            TimeRange::Last30d => ChronoDuration::days(30),
        }
    }

    /// Hourly buckets for a day of data, daily buckets otherwise.
    pub fn bucket_width(&self) -> BucketWidth {
        match self {
            TimeRange::Last24h => BucketWidth::Hour,
            TimeRange::Last7d | TimeRange::Last30d => BucketWidth::Day,
        }
    }

    /// Resolve to a `[since, until)` window ending at `until`.
    pub fn window(&self, until: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (until - self.duration(), until)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_incidents: usize,
    pub active_incidents: usize,
    pub resolved_today: usize,
    pub avg_resolution_time_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRangeInfo {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

/// Complete dashboard payload returned by full-fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload {
    pub summary: DashboardSummary,
    pub timeline: Vec<TimeSeriesBucket>,
    pub service_health: Vec<ServiceHealth>,
    pub urgency_distribution: UrgencyDistribution,
    pub time_range: TimeRangeInfo,
    pub generated_at: DateTime<Utc>,
}

impl DashboardPayload {
    /// Short human-readable summary for display or narration.
    pub fn summary_line(&self) -> String {
        let avg = match self.summary.avg_resolution_time_minutes {
            Some(minutes) => format!("{minutes:.0} min avg resolution"),
            None => "no resolved incidents".to_string(),
        };
        format!(
            "{} incidents in the last {}: {} active, {} resolved today, {}.",
            self.summary.total_incidents,
            self.time_range.label,
            self.summary.active_incidents,
            self.summary.resolved_today,
            avg,
        )
    }
}

/// One row of the live-poll recent-incident list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentIncident {
    pub id: String,
    pub incident_number: u64,
    pub title: String,
    pub status: IncidentStatus,
    pub urgency: Urgency,
    pub service_name: String,
    pub created_at: DateTime<Utc>,
}

/// Lightweight live-poll result; never recomputes the full time-series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStats {
    pub timestamp: DateTime<Utc>,
    pub active_incidents: usize,
    pub triggered_count: usize,
    pub acknowledged_count: usize,
    pub high_urgency_count: usize,
    pub low_urgency_count: usize,
    pub recent_incidents: Vec<RecentIncident>,
}

/// Composes the upstream source, cache and aggregator into the two-operation
/// protocol.
pub struct DashboardService {
    source: Arc<dyn IncidentSource>,
    thresholds: HealthThresholds,
}

impl DashboardService {
    pub fn new(source: Arc<dyn IncidentSource>) -> Self {
        Self {
            source,
            thresholds: HealthThresholds::default(),
        }
    }

    pub fn with_thresholds(source: Arc<dyn IncidentSource>, thresholds: HealthThresholds) -> Self {
        Self { source, thresholds }
    }

    /// Cold path: fetch the full window, aggregate everything.
    pub async fn full_fetch(&self, range: TimeRange) -> Result<DashboardPayload> {
        // Floor the window end to the minute so repeated calls within the
        // cache TTL produce the same upstream filter and hit the cache.
        let (since, until) = range.window(floor_to_minute(Utc::now()));
        debug!(range = range.label(), %since, %until, "full dashboard fetch");

        let incidents = self
            .source
            .list_incidents(&IncidentFilter::window(since, until))
            .await?;
        let services = self.source.list_services(&ServiceFilter::default()).await?;

        Ok(self.assemble(range, since, until, &incidents, &services, Utc::now()))
    }

    /// Deterministic assembly of the payload from a snapshot. Split from
    /// `full_fetch` so the aggregation pipeline can be exercised with a fixed
    /// clock.
    pub fn assemble(
        &self,
        range: TimeRange,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        incidents: &[Incident],
        services: &[crate::upstream::Service],
        generated_at: DateTime<Utc>,
    ) -> DashboardPayload {
        let midnight = until
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(until);

        let active_incidents = incidents.iter().filter(|i| i.status.is_active()).count();
        let resolved_today = incidents
            .iter()
            .filter(|i| i.resolved_at.is_some_and(|t| t >= midnight))
            .count();

        DashboardPayload {
            summary: DashboardSummary {
                total_incidents: incidents.len(),
                active_incidents,
                resolved_today,
                avg_resolution_time_minutes: mean_time_to_resolution(incidents),
            },
            timeline: build_timeline(incidents, range.bucket_width()),
            service_health: service_health(incidents, services, &self.thresholds),
            urgency_distribution: urgency_distribution(incidents),
            time_range: TimeRangeInfo {
                start: since,
                end: until,
                label: range.label().to_string(),
            },
            generated_at,
        }
    }

    /// Steady path: active incidents only, intentionally cheaper than
    /// full-fetch.
    pub async fn live_poll(&self) -> Result<LiveStats> {
        let incidents = self.source.list_incidents(&IncidentFilter::active()).await?;
        Ok(build_live_stats(&incidents, Utc::now()))
    }
}

fn floor_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    let ts = t.timestamp();
    DateTime::from_timestamp(ts - ts.rem_euclid(60), 0).unwrap_or(t)
}

/// Compute live-poll stats from an active-incident snapshot.
pub fn build_live_stats(incidents: &[Incident], timestamp: DateTime<Utc>) -> LiveStats {
    let triggered_count = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Triggered)
        .count();
    let acknowledged_count = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Acknowledged)
        .count();
    let high_urgency_count = incidents
        .iter()
        .filter(|i| i.urgency == Urgency::High)
        .count();

    let mut recent: Vec<&Incident> = incidents.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_incidents = recent
        .into_iter()
        .take(RECENT_INCIDENT_LIMIT)
        .map(|i| RecentIncident {
            id: i.id.clone(),
            incident_number: i.incident_number,
            title: i.title.clone(),
            status: i.status,
            urgency: i.urgency,
            service_name: if i.service.summary.is_empty() {
                i.service.id.clone()
            } else {
                i.service.summary.clone()
            },
            created_at: i.created_at,
        })
        .collect();

    LiveStats {
        timestamp,
        active_incidents: incidents.len(),
        triggered_count,
        acknowledged_count,
        high_urgency_count,
        low_urgency_count: incidents.len() - high_urgency_count,
        recent_incidents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_labels() {
        assert_eq!(TimeRange::parse("24h").unwrap(), TimeRange::Last24h);
        assert_eq!(TimeRange::parse("7d").unwrap(), TimeRange::Last7d);
        assert_eq!(TimeRange::parse("30d").unwrap(), TimeRange::Last30d);
    }

    #[test]
    fn parse_rejects_unknown_label() {
        let err = TimeRange::parse("90d").unwrap_err();
        assert!(matches!(err, OpsboardError::InvalidArgument(_)));
    }

    #[test]
    fn bucket_width_is_hourly_only_for_24h() {
        assert_eq!(TimeRange::Last24h.bucket_width(), BucketWidth::Hour);
        assert_eq!(TimeRange::Last7d.bucket_width(), BucketWidth::Day);
        assert_eq!(TimeRange::Last30d.bucket_width(), BucketWidth::Day);
    }

    #[test]
    fn window_ends_at_until() {
        let until: DateTime<Utc> = "2026-08-25T12:00:00Z".parse().unwrap();
        let (since, end) = TimeRange::Last7d.window(until);
        assert_eq!(end, until);
        assert_eq!(until - since, ChronoDuration::days(7));
    }
}
