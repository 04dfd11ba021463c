use thiserror::Error;

/// Failure of a single backend call.
///
/// All three variants are transient from the dashboard's point of view: the
/// caller turns them into a notification and the next poll tick (or a manual
/// refresh) is the retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection-level failure: DNS, refused connection, timeout, broken body stream.
    #[error("network error calling {url}: {cause}")]
    Network { url: String, cause: String },

    /// Non-2xx response. The body is never parsed.
    #[error("API call failed: {status} {status_text}")]
    HttpStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    /// 2xx response whose body is not the expected JSON.
    #[error("invalid JSON from {url}: {cause}")]
    Parse { url: String, cause: String },
}

impl ApiError {
    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network { .. } | Self::Parse { .. } => None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::HttpStatus { url, .. } | Self::Parse { url, .. } => {
                url
            }
        }
    }

    /// Short category label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::Parse { .. } => "parse",
        }
    }
}
