//! Canned detection requests for trying the backend without real traffic.

use crate::api::types::DetectRequest;

/// A named, pre-filled detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Display name, e.g. `SQL Injection`.
    pub name: &'static str,
    /// Short lookup key, e.g. `sqli`.
    pub key: &'static str,
    pub source_ip: &'static str,
    pub user_agent: Option<&'static str>,
    pub url: Option<&'static str>,
    pub port: u16,
    pub protocol: Option<&'static str>,
}

pub const SAMPLES: [Sample; 3] = [
    Sample {
        name: "SQL Injection",
        key: "sqli",
        source_ip: "192.168.1.100",
        user_agent: Some("sqlmap/1.0"),
        url: Some("http://example.com/admin?id=1' OR '1'='1"),
        port: 80,
        protocol: None,
    },
    Sample {
        name: "XSS Attack",
        key: "xss",
        source_ip: "192.168.1.101",
        user_agent: Some("Mozilla/5.0"),
        url: Some("http://example.com/search?q=<script>alert(\"xss\")</script>"),
        port: 80,
        protocol: None,
    },
    Sample {
        name: "Suspicious Port",
        key: "port",
        source_ip: "192.168.1.102",
        user_agent: None,
        url: None,
        port: 22,
        protocol: Some("ssh"),
    },
];

impl Sample {
    pub fn request(&self) -> DetectRequest {
        DetectRequest {
            source_ip: Some(self.source_ip.to_string()),
            port: Some(self.port),
            protocol: self.protocol.map(str::to_string),
            user_agent: self.user_agent.map(str::to_string),
            url: self.url.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Look up a sample by key or display name, ignoring case.
pub fn find(name: &str) -> Option<&'static Sample> {
    let name = name.trim();
    SAMPLES
        .iter()
        .find(|s| s.key.eq_ignore_ascii_case(name) || s.name.eq_ignore_ascii_case(name))
}
