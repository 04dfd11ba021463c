//! Per-view request sequencing.
//!
//! Every fetch is stamped with the next number for its view. A completion is
//! applied only if its number is greater than the last one applied for that
//! view, so a slow response can never overwrite data from a newer one.

use std::collections::BTreeMap;

/// Unit of sequencing: one independently refreshed piece of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum View {
    Stats,
    /// Health grid, charts and real-time metrics (one `/api/analytics` call).
    Analytics,
    Feed,
    Alerts,
    Logs,
    Detection,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Analytics => "analytics",
            Self::Feed => "feed",
            Self::Alerts => "alerts",
            Self::Logs => "logs",
            Self::Detection => "detection",
        }
    }

    /// User-facing message when a fetch for this view fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Stats | Self::Feed => "Failed to load dashboard data",
            Self::Analytics => "Failed to load analytics",
            Self::Alerts => "Failed to load alerts",
            Self::Logs => "Failed to load threat logs",
            Self::Detection => "Failed to analyze threats",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    issued: u64,
    applied: u64,
}

#[derive(Debug, Default)]
pub struct ViewSequencer {
    views: BTreeMap<View, Counters>,
}

impl ViewSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new request for `view`.
    pub fn issue(&mut self, view: View) -> u64 {
        let counters = self.views.entry(view).or_default();
        counters.issued += 1;
        counters.issued
    }

    /// Record a successful completion. Returns `false` (and changes nothing)
    /// when a newer response for `view` has already been applied.
    pub fn accept(&mut self, view: View, seq: u64) -> bool {
        let counters = self.views.entry(view).or_default();
        if seq <= counters.applied {
            return false;
        }
        counters.applied = seq;
        true
    }

    pub fn last_issued(&self, view: View) -> u64 {
        self.views.get(&view).map_or(0, |c| c.issued)
    }

    pub fn last_applied(&self, view: View) -> u64 {
        self.views.get(&view).map_or(0, |c| c.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_response_wins_regardless_of_arrival_order() {
        let mut seq = ViewSequencer::new();
        let a = seq.issue(View::Logs);
        let b = seq.issue(View::Logs);

        assert!(seq.accept(View::Logs, b));
        assert!(!seq.accept(View::Logs, a));
        assert_eq!(seq.last_applied(View::Logs), b);
    }

    #[test]
    fn in_order_completions_all_apply() {
        let mut seq = ViewSequencer::new();
        let a = seq.issue(View::Stats);
        let b = seq.issue(View::Stats);
        assert!(seq.accept(View::Stats, a));
        assert!(seq.accept(View::Stats, b));
    }

    #[test]
    fn views_are_sequenced_independently() {
        let mut seq = ViewSequencer::new();
        let logs = seq.issue(View::Logs);
        seq.issue(View::Logs);
        let stats = seq.issue(View::Stats);

        assert_eq!(logs, 1);
        assert_eq!(stats, 1);
        assert!(seq.accept(View::Stats, stats));
        assert!(seq.accept(View::Logs, logs));
        assert_eq!(seq.last_issued(View::Logs), 2);
        assert_eq!(seq.last_applied(View::Alerts), 0);
    }

    #[test]
    fn replayed_completion_is_dropped() {
        let mut seq = ViewSequencer::new();
        let a = seq.issue(View::Feed);
        assert!(seq.accept(View::Feed, a));
        assert!(!seq.accept(View::Feed, a));
    }
}
