/// API gateway for the threat-detection backend.
///
/// A thin typed wrapper over outbound HTTP: it builds the absolute URL from
/// the configured base URL, applies the default method and headers, and
/// classifies every outcome into JSON or an [`ApiError`]. No retries happen
/// here; the poller's next tick is the retry.
pub mod error;
pub mod transport;
pub mod types;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
use types::{
    Alert, AnalyticsSnapshot, DeleteResponse, DetectRequest, DetectResponse, HealthStatus,
    Severity, StatsResponse, ThreatsResponse,
};

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// Per-call overrides. Defaults: `GET`, `Content-Type: application/json`,
/// no body.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        }
    }
}

impl CallOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::default()
        }
    }

    /// `POST` with `body` serialized as JSON.
    pub fn post_json<T: Serialize>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: Method::Post,
            body: Some(serde_json::to_string(body)?),
            ..Self::default()
        })
    }

    /// Set a header, replacing any existing header with the same name
    /// (compared case-insensitively).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Typed access to the backend REST API.
#[derive(Clone)]
pub struct ApiGateway {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ApiGateway {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a relative endpoint.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Issue one request and parse the JSON body.
    ///
    /// Status is checked before any body parsing: a non-2xx response is an
    /// [`ApiError::HttpStatus`] regardless of what the body contains.
    pub fn call(&self, endpoint: &str, options: CallOptions) -> Result<Value, ApiError> {
        let url = self.url_for(endpoint);
        let request = HttpRequest {
            method: options.method,
            url: url.clone(),
            headers: options.headers,
            body: options.body,
        };

        let response = self
            .transport
            .send(&request)
            .map_err(|cause| ApiError::Network {
                url: url.clone(),
                cause,
            })?;

        if !response.is_success() {
            return Err(ApiError::HttpStatus {
                url,
                status: response.status,
                status_text: response.status_text,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| ApiError::Parse {
            url,
            cause: e.to_string(),
        })
    }

    /// `call` followed by decoding into a typed response.
    pub fn call_typed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<T, ApiError> {
        let value = self.call(endpoint, options)?;
        decode(&self.url_for(endpoint), value)
    }

    // -- Operations --

    /// `GET /api/stats`
    pub fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.call_typed("/api/stats", CallOptions::get())
    }

    /// `GET /api/analytics`
    pub fn analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
        self.call_typed("/api/analytics", CallOptions::get())
    }

    /// `GET /api/threats?limit=N&severity=S`
    pub fn threats(
        &self,
        limit: Option<u32>,
        severity: Option<Severity>,
    ) -> Result<ThreatsResponse, ApiError> {
        self.call_typed(&threats_endpoint(limit, severity), CallOptions::get())
    }

    /// `GET /api/alerts?severity=S`
    pub fn alerts(&self, severity: Option<Severity>) -> Result<Vec<Alert>, ApiError> {
        self.call_typed(&alerts_endpoint(severity), CallOptions::get())
    }

    /// `POST /api/detect`
    pub fn detect(&self, request: &DetectRequest) -> Result<DetectResponse, ApiError> {
        let endpoint = "/api/detect";
        let options = CallOptions::post_json(request).map_err(|e| ApiError::Parse {
            url: self.url_for(endpoint),
            cause: e.to_string(),
        })?;
        self.call_typed(endpoint, options)
    }

    /// `DELETE /api/threats/{id}`
    pub fn delete_threat(&self, id: &str) -> Result<DeleteResponse, ApiError> {
        self.call_typed(&delete_endpoint(id), CallOptions::delete())
    }

    /// `GET /api/health`
    pub fn health(&self) -> Result<HealthStatus, ApiError> {
        self.call_typed("/api/health", CallOptions::get())
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse {
        url: url.to_string(),
        cause: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Endpoint builders
// ---------------------------------------------------------------------------

pub fn threats_endpoint(limit: Option<u32>, severity: Option<Severity>) -> String {
    let mut params = Vec::new();
    if let Some(severity) = severity {
        params.push(format!("severity={}", urlencoding::encode(severity.as_str())));
    }
    if let Some(limit) = limit {
        params.push(format!("limit={limit}"));
    }
    with_query("/api/threats", &params)
}

pub fn alerts_endpoint(severity: Option<Severity>) -> String {
    let params: Vec<String> = severity
        .map(|s| format!("severity={}", urlencoding::encode(s.as_str())))
        .into_iter()
        .collect();
    with_query("/api/alerts", &params)
}

pub fn delete_endpoint(id: &str) -> String {
    format!("/api/threats/{}", urlencoding::encode(id))
}

fn with_query(path: &str, params: &[String]) -> String {
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", params.join("&"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
