//! View models: display-ready shapes of backend data.
//!
//! Everything here is a pure transform from API payloads to plain structs.
//! No network, no timers, no terminal output; the display layer decides how
//! a [`Listing`] or a [`StatsView`] actually looks.

mod dashboard;
mod lists;
mod notification;

use chrono::{DateTime, NaiveDateTime, Utc};

pub use dashboard::{FEED_SIZE, FeedEntry, HealthSlot, HealthView, MetricsView, StatsView, feed_view};
pub use lists::{
    AlertEntry, DetectionView, ThreatEntry, alerts_view, annotation_for, detection_view,
    filter_logs, logs_view,
};
pub use notification::{NOTIFICATION_TTL, Notification, NotificationKind};

/// Status string used for health slots the backend did not report.
pub const UNKNOWN_STATUS: &str = "unknown";

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Empty-state card shown instead of an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub title: &'static str,
    /// Short label rendered next to the title (e.g. `Safe`).
    pub badge: Option<&'static str>,
    pub message: &'static str,
    /// Extra metadata lines.
    pub meta: &'static [&'static str],
}

/// A list that is never rendered empty: either entries or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<T> {
    Placeholder(Placeholder),
    Entries(Vec<T>),
}

impl<T> Listing<T> {
    /// `Entries` unless `items` is empty, in which case `placeholder`.
    pub fn from_items(items: Vec<T>, placeholder: Placeholder) -> Self {
        if items.is_empty() {
            Self::Placeholder(placeholder)
        } else {
            Self::Entries(items)
        }
    }

    pub fn entries(&self) -> &[T] {
        match self {
            Self::Entries(items) => items,
            Self::Placeholder(_) => &[],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Relative age of a backend timestamp.
///
/// `Just now` under a minute (including timestamps in the future), `Nm ago`
/// under an hour, `Nh ago` under a day, otherwise the calendar date.
/// Missing or unparseable timestamps render as `Unknown`.
pub fn format_relative_time(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(at) = timestamp.and_then(parse_timestamp) else {
        return "Unknown".to_string();
    };

    let diff_ms = (now - at).num_milliseconds();
    if diff_ms < 60_000 {
        "Just now".to_string()
    } else if diff_ms < 3_600_000 {
        format!("{}m ago", diff_ms / 60_000)
    } else if diff_ms < 86_400_000 {
        format!("{}h ago", diff_ms / 3_600_000)
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

/// Parse RFC 3339, or a naive ISO timestamp interpreted as UTC (the backend
/// emits `datetime.utcnow().isoformat()` style values without an offset).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Confidence in `[0, 1]` as a rounded, clamped percentage.
pub fn confidence_percent(confidence: f64) -> u8 {
    if !confidence.is_finite() {
        return 0;
    }
    (confidence * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Render a rate without a trailing `.0` for whole numbers.
pub fn format_rate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn relative_time_buckets() {
        let now = now();
        let ago = |d: Duration| (now - d).to_rfc3339();

        assert_eq!(format_relative_time(Some(&ago(Duration::seconds(30))), now), "Just now");
        assert_eq!(format_relative_time(Some(&ago(Duration::minutes(5))), now), "5m ago");
        assert_eq!(format_relative_time(Some(&ago(Duration::minutes(59))), now), "59m ago");
        assert_eq!(format_relative_time(Some(&ago(Duration::hours(3))), now), "3h ago");
        assert_eq!(format_relative_time(Some(&ago(Duration::days(3))), now), "2026-10-13");
    }

    #[test]
    fn relative_time_handles_naive_and_missing() {
        let now = now();
        assert_eq!(
            format_relative_time(Some("2026-10-16T11:49:59.500000"), now),
            "10m ago"
        );
        // 9m59.88s floors to nine minutes.
        assert_eq!(
            format_relative_time(Some("2026-10-16T11:50:00.123456"), now),
            "9m ago"
        );
        assert_eq!(format_relative_time(None, now), "Unknown");
        assert_eq!(format_relative_time(Some("yesterday"), now), "Unknown");
        assert_eq!(
            format_relative_time(Some("2026-10-16T12:05:00Z"), now),
            "Just now"
        );
    }

    #[test]
    fn confidence_is_rounded_and_clamped() {
        assert_eq!(confidence_percent(0.9), 90);
        assert_eq!(confidence_percent(0.756), 76);
        assert_eq!(confidence_percent(1.7), 100);
        assert_eq!(confidence_percent(-0.2), 0);
        assert_eq!(confidence_percent(f64::NAN), 0);
    }

    #[test]
    fn rates_drop_trailing_zero() {
        assert_eq!(format_rate(10.0), "10");
        assert_eq!(format_rate(2.26), "2.3");
    }

    #[test]
    fn listing_falls_back_to_placeholder() {
        const EMPTY: Placeholder = Placeholder {
            title: "Nothing",
            badge: None,
            message: "empty",
            meta: &[],
        };
        let empty: Listing<u8> = Listing::from_items(vec![], EMPTY);
        assert!(empty.is_placeholder());
        assert!(empty.entries().is_empty());

        let full = Listing::from_items(vec![1, 2], EMPTY);
        assert_eq!(full.entries(), &[1, 2]);
    }
}
