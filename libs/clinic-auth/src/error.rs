use thiserror::Error;

/// Errors decoding session token claims
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token payload is not the expected JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the login/register flow
#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Http(#[from] clinic_http::HttpError),

    #[error("Invalid auth endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Login response carried an empty token")]
    EmptyToken,
}

impl LoginError {
    /// True when the backend rejected the credentials (401).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http(e) if e.status() == Some(http::StatusCode::UNAUTHORIZED))
    }
}
