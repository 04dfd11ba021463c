use chrono::{DateTime, Utc};

use super::{Listing, Placeholder, confidence_percent, format_relative_time};
use crate::api::types::{Alert, DetectResponse, Severity, ThreatRecord};

const SAFE_TRAFFIC: Placeholder = Placeholder {
    title: "No Threats Detected",
    badge: Some("Safe"),
    message: "The analyzed traffic appears to be normal and safe.",
    meta: &["Confidence: 100%", "Method: Pattern Analysis"],
};

const NO_ALERTS: Placeholder = Placeholder {
    title: "No Alerts",
    badge: Some("Just now"),
    message: "No alerts have been generated recently.",
    meta: &[],
};

const NO_THREATS_LOGGED: Placeholder = Placeholder {
    title: "No Threats Logged",
    badge: Some("Safe"),
    message: "No threats have been detected and logged.",
    meta: &[],
};

/// Display annotations keyed by threat type. Purely cosmetic.
const ANNOTATIONS: &[(&str, &str)] = &[
    ("ml_detected_threat", "Detected by ML Model"),
    ("anomaly_detected", "Anomaly: High request rate"),
];

pub fn annotation_for(threat_type: &str) -> Option<&'static str> {
    ANNOTATIONS
        .iter()
        .find(|(t, _)| *t == threat_type)
        .map(|(_, note)| *note)
}

// ---------------------------------------------------------------------------
// Threat entries (detection results and logs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatEntry {
    pub id: String,
    pub threat_type: String,
    pub severity: Severity,
    pub description: String,
    pub annotation: Option<&'static str>,
    pub confidence_pct: u8,
    pub method: String,
    pub source: String,
    pub time: String,
}

impl ThreatEntry {
    pub fn from_record(threat: &ThreatRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: threat.id.clone(),
            threat_type: threat.threat_type.clone(),
            severity: threat.severity,
            description: threat.description.clone(),
            annotation: annotation_for(&threat.threat_type),
            confidence_pct: confidence_percent(threat.confidence),
            method: threat.detection_method.clone(),
            source: threat
                .source_ip
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            time: format_relative_time(threat.timestamp.as_deref(), now),
        }
    }

    /// Case-insensitive substring match over the visible text of the entry.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let confidence = format!("Confidence: {}%", self.confidence_pct);
        [
            self.threat_type.as_str(),
            self.severity.as_str(),
            self.description.as_str(),
            self.annotation.unwrap_or(""),
            confidence.as_str(),
            self.method.as_str(),
            self.source.as_str(),
            self.time.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Results panel for one detection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionView {
    pub badge: String,
    pub results: Listing<ThreatEntry>,
}

pub fn detection_view(response: &DetectResponse, now: DateTime<Utc>) -> DetectionView {
    let results = if response.threats_detected == 0 {
        Listing::Placeholder(SAFE_TRAFFIC)
    } else {
        let entries = response
            .threats
            .iter()
            .map(|t| ThreatEntry::from_record(t, now))
            .collect();
        Listing::from_items(entries, SAFE_TRAFFIC)
    };
    DetectionView {
        badge: format!("{} Threats", response.threats_detected),
        results,
    }
}

pub fn logs_view(threats: &[ThreatRecord], now: DateTime<Utc>) -> Listing<ThreatEntry> {
    let entries = threats
        .iter()
        .map(|t| ThreatEntry::from_record(t, now))
        .collect();
    Listing::from_items(entries, NO_THREATS_LOGGED)
}

/// Entries of `logs` matching the search term (all of them for an empty term).
pub fn filter_logs<'a>(logs: &'a Listing<ThreatEntry>, term: &str) -> Vec<&'a ThreatEntry> {
    logs.entries().iter().filter(|e| e.matches(term)).collect()
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEntry {
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub time: String,
}

pub fn alerts_view(alerts: &[Alert], now: DateTime<Utc>) -> Listing<AlertEntry> {
    let entries = alerts
        .iter()
        .map(|a| AlertEntry {
            title: a.alert_type.clone().unwrap_or_else(|| "Alert".to_string()),
            severity: a.severity.unwrap_or(Severity::Low),
            description: a
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            time: format_relative_time(a.timestamp.as_deref(), now),
        })
        .collect();
    Listing::from_items(entries, NO_ALERTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threat(id: &str, threat_type: &str, confidence: f64) -> ThreatRecord {
        ThreatRecord {
            id: id.to_string(),
            threat_type: threat_type.to_string(),
            severity: Severity::High,
            description: format!("{threat_type} seen"),
            confidence,
            detection_method: "pattern_matching".to_string(),
            source_ip: None,
            timestamp: None,
        }
    }

    #[test]
    fn zero_detections_render_safe_placeholder() {
        let view = detection_view(&DetectResponse::default(), Utc::now());
        assert_eq!(view.badge, "0 Threats");
        assert_eq!(view.results, Listing::Placeholder(SAFE_TRAFFIC));
    }

    #[test]
    fn detections_show_rounded_confidence() {
        let response = DetectResponse {
            threats_detected: 2,
            threats: vec![threat("a", "suspicious_pattern", 0.9), threat("b", "ai_detected_threat", 0.666)],
        };
        let view = detection_view(&response, Utc::now());
        let entries = view.results.entries();
        assert_eq!(view.badge, "2 Threats");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].confidence_pct, 90);
        assert_eq!(entries[1].confidence_pct, 67);
        assert_eq!(entries[0].source, "Unknown");
    }

    #[test]
    fn empty_logs_render_placeholder_not_empty_list() {
        let logs = logs_view(&[], Utc::now());
        assert_eq!(logs, Listing::Placeholder(NO_THREATS_LOGGED));
    }

    #[test]
    fn annotations_only_for_tagged_types() {
        let logs = logs_view(
            &[
                threat("1", "ml_detected_threat", 0.8),
                threat("2", "anomaly_detected", 0.95),
                threat("3", "suspicious_port", 0.7),
            ],
            Utc::now(),
        );
        let notes: Vec<_> = logs.entries().iter().map(|e| e.annotation).collect();
        assert_eq!(
            notes,
            vec![
                Some("Detected by ML Model"),
                Some("Anomaly: High request rate"),
                None
            ]
        );
    }

    #[test]
    fn search_filters_case_insensitively() {
        let logs = logs_view(
            &[threat("1", "ml_detected_threat", 0.8), threat("2", "suspicious_port", 0.7)],
            Utc::now(),
        );
        assert_eq!(filter_logs(&logs, "").len(), 2);
        assert_eq!(filter_logs(&logs, "ML MODEL").len(), 1);
        assert_eq!(filter_logs(&logs, "port")[0].id, "2");
        assert!(filter_logs(&logs, "nothing-like-this").is_empty());
    }

    #[test]
    fn search_covers_confidence_and_time() {
        let mut recent = threat("1", "suspicious_port", 0.9);
        recent.timestamp = Some((Utc::now() - chrono::Duration::minutes(5)).to_rfc3339());
        let logs = logs_view(&[recent, threat("2", "suspicious_port", 0.42)], Utc::now());

        assert_eq!(filter_logs(&logs, "confidence: 90%")[0].id, "1");
        assert_eq!(filter_logs(&logs, "42%")[0].id, "2");
        assert_eq!(filter_logs(&logs, "5m ago").len(), 1);
        assert_eq!(filter_logs(&logs, "unknown").len(), 2);
    }

    #[test]
    fn detection_views_compare_by_value() {
        fn total_eq<T: Eq>(a: &T, b: &T) -> bool {
            a == b
        }
        let now = Utc::now();
        let response = DetectResponse {
            threats_detected: 1,
            threats: vec![threat("a", "xss_attack", 0.8)],
        };
        assert!(total_eq(&detection_view(&response, now), &detection_view(&response, now)));
        assert!(!total_eq(
            &detection_view(&response, now),
            &detection_view(&DetectResponse::default(), now)
        ));
    }

    #[test]
    fn alerts_fill_in_defaults() {
        let alerts = alerts_view(&[Alert::default()], Utc::now());
        let entry = &alerts.entries()[0];
        assert_eq!(entry.title, "Alert");
        assert_eq!(entry.severity, Severity::Low);
        assert_eq!(entry.description, "No description");
        assert_eq!(entry.time, "Unknown");

        assert!(alerts_view(&[], Utc::now()).is_placeholder());
    }
}
