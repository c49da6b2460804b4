use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// How much of a non-2xx body is kept in [`HttpError::Status`].
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 4 * 1024;

/// Response body after decompression.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// A received response whose body has not been read yet.
///
/// Every read stops with `BodyTooLarge` past the configured body limit.
#[derive(Debug)]
pub struct HttpResponse {
    inner: Response<ResponseBody>,
    body_limit: usize,
}

impl HttpResponse {
    pub(crate) fn new(inner: Response<ResponseBody>, body_limit: usize) -> Self {
        Self { inner, body_limit }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The body, whatever the status.
    ///
    /// # Errors
    /// `BodyTooLarge`, or `Transport` if the connection drops mid-body.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        collect(self.inner, self.body_limit).await
    }

    /// The body of a 2xx response.
    ///
    /// # Errors
    /// `HttpError::Status` for any other status, carrying a preview of the
    /// error body; otherwise as [`bytes`](Self::bytes).
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        let status = self.inner.status();
        if status.is_success() {
            return self.bytes().await;
        }

        let limit = self.body_limit.min(ERROR_BODY_PREVIEW_LIMIT);
        let body = match collect(self.inner, limit).await {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            // the status matters more than the body
            Err(HttpError::BodyTooLarge { .. }) => None,
            Err(err) => return Err(err),
        };
        Err(HttpError::Status { status, body })
    }

    /// # Errors
    /// As [`checked_bytes`](Self::checked_bytes), plus `Json` for a body
    /// that is not a `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let bytes = self.checked_bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn collect(response: Response<ResponseBody>, limit: usize) -> Result<Bytes, HttpError> {
    let mut body = response.into_body();
    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if buf.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge { limit });
            }
            buf.extend_from_slice(chunk);
        }
    }
    Ok(buf.freeze())
}
