use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of one request/response exchange.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// The request could not be assembled
    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The URL has no host, or a scheme the transport does not allow
    #[error("cannot request {url}: {reason}")]
    UnsupportedUrl { url: String, reason: &'static str },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Connect, DNS or protocol failure
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] BoxError),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Non-2xx answer; `body` holds the start of the error body, if any
    #[error("HTTP {status}{}", .body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    Status {
        status: http::StatusCode,
        body: Option<String>,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether no usable HTTP answer arrived.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Transport(_) | Self::Tls(_) | Self::BodyTooLarge { .. }
        )
    }

    /// Error bubbled up through the tower stack.
    pub(crate) fn from_stack(err: BoxError, timeout: Duration) -> Self {
        if err.is::<tower::timeout::error::Elapsed>() {
            return Self::Timeout(timeout);
        }
        match err.downcast::<Self>() {
            Ok(err) => *err,
            Err(other) => Self::Transport(other),
        }
    }
}
