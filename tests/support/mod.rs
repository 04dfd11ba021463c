//! Scripted stand-in for the detection backend, served with `tiny_http`.
//!
//! Each test starts its own server on an ephemeral port. Requests are
//! answered by a routing closure and recorded for later assertions.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string.
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

pub type Route = Box<dyn Fn(&str, &str) -> (u16, String) + Send + 'static>;

pub struct MockBackend {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockBackend {
    pub fn start(route: impl Fn(&str, &str) -> (u16, String) + Send + 'static) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock backend");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock backend listens on TCP");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let seen = seen.clone();
            let stop = stop.clone();
            thread::spawn(move || serve(server, Box::new(route), seen, stop))
        };

        Self {
            base_url: format!("http://{addr}"),
            seen,
            stop,
            handle: Some(handle),
        }
    }

    /// A backend with canned answers for every endpoint the dashboard uses.
    pub fn standard() -> Self {
        Self::start(standard_route)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    /// How many requests matched `method` and exact `url`.
    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(server: Server, route: Route, seen: Arc<Mutex<Vec<Recorded>>>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        let mut request = match server.recv_timeout(Duration::from_millis(20)) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(_) => break,
        };

        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let method = request.method().to_string();
        let url = request.url().to_string();
        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.to_string().eq_ignore_ascii_case("content-type"))
            .map(|h| h.value.to_string());

        seen.lock().unwrap().push(Recorded {
            method: method.clone(),
            url: url.clone(),
            content_type,
            body,
        });

        let (status, reply) = route(&method, &url);
        let response = Response::from_data(reply.into_bytes())
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap())
            .with_status_code(StatusCode(status));
        let _ = request.respond(response);
    }
}

/// Canned answers modelled on the real backend's payloads.
pub fn standard_route(method: &str, url: &str) -> (u16, String) {
    let path = url.split('?').next().unwrap_or(url);
    let body = match (method, path) {
        ("GET", "/api/stats") => r#"{"threats":{"total":12},"alerts":{"total":3}}"#,
        ("GET", "/api/analytics") => {
            r#"{
                "system_health": {
                    "overall_status": "healthy",
                    "checks": {
                        "threat_detection": {"status": "healthy", "message": "ok"},
                        "alert_system": {"status": "warning"},
                        "telemetry": {"status": "healthy"}
                    }
                },
                "threat_analytics": {
                    "threats_by_type": {"sql_injection": 5, "xss_attack": 4, "suspicious_port": 3},
                    "threats_by_severity": {"critical": 2, "high": 6, "medium": 4},
                    "avg_confidence": 0.87,
                    "total_threats": 12
                },
                "real_time_metrics": {"threats_per_minute": 2, "requests_per_minute": 40}
            }"#
        }
        ("GET", "/api/threats") => {
            r#"{"threats": [
                {"id": "abc123", "type": "sql_injection", "severity": "critical",
                 "description": "SQL injection attempt detected", "confidence": 0.9,
                 "detection_method": "pattern_matching", "source_ip": "192.168.1.100",
                 "timestamp": "2026-10-16T11:59:00"},
                {"id": "def456", "type": "ml_detected_threat", "severity": "high",
                 "description": "Model flagged request", "confidence": 0.81,
                 "detection_method": "ml_model"}
            ]}"#
        }
        ("GET", "/api/alerts") => {
            r#"[{"id": "a1", "type": "threat_detected", "severity": "high",
                 "description": "High severity threat", "timestamp": "2026-10-16T11:00:00"}]"#
        }
        ("GET", "/api/health") => {
            r#"{"status": "healthy", "service": "threat-detection", "version": "1.0.0"}"#
        }
        ("POST", "/api/detect") => {
            r#"{"threats_detected": 1, "threats": [
                {"id": "new1", "type": "sql_injection", "severity": "critical",
                 "description": "SQL injection pattern in URL", "confidence": 0.95,
                 "detection_method": "pattern_matching", "source_ip": "192.168.1.100"}
            ]}"#
        }
        ("DELETE", "/api/threats/abc123") => {
            r#"{"message": "Threat deleted successfully", "total_threats": 11}"#
        }
        ("DELETE", _) => return (404, r#"{"error": "Threat not found"}"#.to_string()),
        _ => return (404, r#"{"error": "not found"}"#.to_string()),
    };
    (200, body.to_string())
}

/// A base URL on which nothing is listening.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}
