//! Navigation beacon: report a visited page to the detection backend.
//!
//! One `POST /api/detect` per page, only for `http`/`https` URLs. The
//! outcome is ignored and the request is never retried.

use crate::activity;
use crate::api::ApiGateway;
use crate::api::types::DetectRequest;

/// `source_ip` value identifying beacon traffic to the backend.
pub const BEACON_SOURCE: &str = "browser_extension";

/// Whether `url` is eligible for reporting.
pub fn is_reportable(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn beacon_request(url: &str, user_agent: &str) -> DetectRequest {
    DetectRequest {
        url: Some(url.to_string()),
        user_agent: Some(user_agent.to_string()),
        source_ip: Some(BEACON_SOURCE.to_string()),
        ..Default::default()
    }
}

/// Fire the beacon. Returns whether a request was sent (not whether it
/// succeeded).
pub fn report_navigation(gateway: &ApiGateway, url: &str, user_agent: &str) -> bool {
    if !is_reportable(url) {
        return false;
    }
    if let Err(e) = gateway.detect(&beacon_request(url, user_agent)) {
        activity::warn("beacon.failed", &e.to_string());
    }
    true
}
