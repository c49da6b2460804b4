use clinic_http::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors surfaced by resource reads and mutations.
///
/// Nothing here is fatal: list controllers keep previous data and expose the
/// error, mutations hand it to the caller.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Backend unreachable or timed out
    #[error("transport error: {0}")]
    Transport(#[source] HttpError),

    /// Backend answered with a non-2xx status (401 included)
    #[error("HTTP {code}{}", .body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    HttpStatus {
        code: StatusCode,
        body: Option<String>,
    },

    /// Body is not valid JSON or not the expected shape
    #[error("unexpected response body: {0}")]
    Decoding(String),

    /// Request payload could not be serialized
    #[error("failed to encode request payload: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Resource name or path segment is empty or a dot segment
    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl ResourceError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<HttpError> for ResourceError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => Self::HttpStatus { code: status, body },
            HttpError::Json(e) => Self::Decoding(e.to_string()),
            other => Self::Transport(other),
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}
