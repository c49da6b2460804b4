use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ClaimsError;

/// Claims the clinic backend puts in its session tokens.
///
/// Read for display and local expiry hints only. The signature is not
/// checked here; the backend remains the authority on validity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    /// Expiry as unix seconds
    #[serde(default)]
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Decode the payload segment of a compact JWT without verifying it.
    ///
    /// # Errors
    /// Returns `ClaimsError` if the token is not three dot-separated segments,
    /// the payload is not base64url, or the JSON lacks `userId`/`role`.
    pub fn peek(token: &str) -> Result<Self, ClaimsError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(ClaimsError::Malformed(
                "expected three dot-separated segments".to_owned(),
            ));
        };

        // Some issuers pad; URL_SAFE_NO_PAD rejects trailing '='
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Tokens without `exp` never expire locally.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}
