use chrono::{DateTime, Utc};

use super::{Listing, Placeholder, UNKNOWN_STATUS, confidence_percent, format_relative_time};
use crate::api::types::{AnalyticsSnapshot, StatsResponse, SystemHealth, ThreatRecord};

/// Maximum number of entries in the dashboard threat feed.
pub const FEED_SIZE: usize = 5;

const NO_RECENT_THREATS: Placeholder = Placeholder {
    title: "No recent threats detected",
    badge: None,
    message: "Just now",
    meta: &[],
};

// ---------------------------------------------------------------------------
// Stats cards
// ---------------------------------------------------------------------------

/// The four headline numbers of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsView {
    pub total_threats: u64,
    pub active_alerts: u64,
    /// Same value as `total_threats`: the backend offers no per-day count.
    pub threats_today: u64,
    /// Placeholder until the backend reports response times.
    pub avg_response: &'static str,
}

impl StatsView {
    pub fn from_response(stats: &StatsResponse) -> Self {
        Self {
            total_threats: stats.threats.total,
            active_alerts: stats.alerts.total,
            threats_today: stats.threats.total,
            avg_response: "0ms",
        }
    }
}

// ---------------------------------------------------------------------------
// System health grid
// ---------------------------------------------------------------------------

/// Named slots of the health grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthSlot {
    ThreatDetection,
    AlertSystem,
    Performance,
    DataProcessing,
}

impl HealthSlot {
    pub const ALL: [HealthSlot; 4] = [
        Self::ThreatDetection,
        Self::AlertSystem,
        Self::Performance,
        Self::DataProcessing,
    ];

    /// Check name used by the backend.
    pub fn key(self) -> &'static str {
        match self {
            Self::ThreatDetection => "threat_detection",
            Self::AlertSystem => "alert_system",
            Self::Performance => "performance",
            Self::DataProcessing => "data_processing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ThreatDetection => "Threat Detection",
            Self::AlertSystem => "Alert System",
            Self::Performance => "Performance",
            Self::DataProcessing => "Data Processing",
        }
    }
}

/// Status of every known health slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthView {
    pub slots: Vec<(HealthSlot, String)>,
}

impl Default for HealthView {
    fn default() -> Self {
        Self {
            slots: HealthSlot::ALL
                .iter()
                .map(|slot| (*slot, UNKNOWN_STATUS.to_string()))
                .collect(),
        }
    }
}

impl HealthView {
    /// Map backend checks onto the known slots.
    ///
    /// Unknown check names are ignored. A known slot with no matching check
    /// resets to `unknown` rather than keeping a stale status.
    pub fn from_health(health: &SystemHealth) -> Self {
        let slots = HealthSlot::ALL
            .iter()
            .map(|slot| {
                let status = health
                    .checks
                    .get(slot.key())
                    .map(|check| check.status.trim())
                    .filter(|s| !s.is_empty())
                    .unwrap_or(UNKNOWN_STATUS);
                (*slot, status.to_string())
            })
            .collect();
        Self { slots }
    }

    pub fn status(&self, slot: HealthSlot) -> &str {
        self.slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, status)| status.as_str())
            .unwrap_or(UNKNOWN_STATUS)
    }
}

// ---------------------------------------------------------------------------
// Real-time metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsView {
    pub threats_per_minute: f64,
    pub requests_per_minute: f64,
    pub avg_confidence_pct: u8,
    pub uptime: &'static str,
}

impl MetricsView {
    pub fn from_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        Self {
            threats_per_minute: snapshot.real_time_metrics.threats_per_minute,
            requests_per_minute: snapshot.real_time_metrics.requests_per_minute,
            avg_confidence_pct: confidence_percent(snapshot.threat_analytics.avg_confidence),
            uptime: "100%",
        }
    }
}

// ---------------------------------------------------------------------------
// Threat feed
// ---------------------------------------------------------------------------

/// One line of the dashboard feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub description: String,
    pub time: String,
}

/// The most recent threats, in backend order, capped at [`FEED_SIZE`].
pub fn feed_view(threats: &[ThreatRecord], now: DateTime<Utc>) -> Listing<FeedEntry> {
    let entries = threats
        .iter()
        .take(FEED_SIZE)
        .map(|t| FeedEntry {
            description: t.description.clone(),
            time: format_relative_time(t.timestamp.as_deref(), now),
        })
        .collect();
    Listing::from_items(entries, NO_RECENT_THREATS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{CountBlock, HealthCheck};
    use std::collections::BTreeMap;

    fn check(status: &str) -> HealthCheck {
        HealthCheck {
            status: status.to_string(),
            message: None,
        }
    }

    #[test]
    fn stats_mirror_totals() {
        let view = StatsView::from_response(&StatsResponse {
            threats: CountBlock { total: 12 },
            alerts: CountBlock { total: 4 },
        });
        assert_eq!(view.total_threats, 12);
        assert_eq!(view.threats_today, 12);
        assert_eq!(view.active_alerts, 4);
        assert_eq!(view.avg_response, "0ms");
    }

    #[test]
    fn health_ignores_unknown_checks_and_resets_missing_slots() {
        let mut checks = BTreeMap::new();
        checks.insert("threat_detection".to_string(), check("healthy"));
        checks.insert("performance".to_string(), check("degraded"));
        checks.insert("quantum_flux".to_string(), check("critical"));

        let view = HealthView::from_health(&SystemHealth {
            overall_status: None,
            checks,
        });

        assert_eq!(view.status(HealthSlot::ThreatDetection), "healthy");
        assert_eq!(view.status(HealthSlot::Performance), "degraded");
        assert_eq!(view.status(HealthSlot::AlertSystem), UNKNOWN_STATUS);
        assert_eq!(view.status(HealthSlot::DataProcessing), UNKNOWN_STATUS);
        assert_eq!(view.slots.len(), 4);
    }

    #[test]
    fn empty_feed_renders_placeholder() {
        let feed = feed_view(&[], Utc::now());
        assert_eq!(feed, Listing::Placeholder(NO_RECENT_THREATS));
    }

    #[test]
    fn feed_keeps_backend_order_and_caps_length() {
        let threats: Vec<ThreatRecord> = (0..8)
            .map(|i| ThreatRecord {
                description: format!("threat {i}"),
                ..Default::default()
            })
            .collect();
        let feed = feed_view(&threats, Utc::now());
        let descriptions: Vec<_> = feed.entries().iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["threat 0", "threat 1", "threat 2", "threat 3", "threat 4"]
        );
        assert_eq!(feed.entries()[0].time, "Unknown");
    }

    #[test]
    fn metrics_round_average_confidence() {
        let mut snapshot = AnalyticsSnapshot::default();
        snapshot.threat_analytics.avg_confidence = 0.75;
        snapshot.real_time_metrics.requests_per_minute = 10.0;
        let metrics = MetricsView::from_snapshot(&snapshot);
        assert_eq!(metrics.avg_confidence_pct, 75);
        assert_eq!(metrics.requests_per_minute, 10.0);
        assert_eq!(metrics.threats_per_minute, 0.0);
    }
}
