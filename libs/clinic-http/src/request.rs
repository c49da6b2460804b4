use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, Method, Request};
use http_body_util::Full;
use serde::Serialize;
use tower::ServiceExt;
use url::Url;

use crate::builder::InnerService;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::response::HttpResponse;

/// One pending request. Nothing is sent until [`send`](Self::send).
#[must_use = "a request is only sent by .send()"]
pub struct RequestBuilder {
    service: InnerService,
    body_limit: usize,
    transport: TransportSecurity,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: InnerService,
        body_limit: usize,
        transport: TransportSecurity,
        method: Method,
        url: Url,
    ) -> Self {
        Self {
            service,
            body_limit,
            transport,
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Replaces any earlier value of the same header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// JSON body; sets `Content-Type: application/json` unless already set.
    ///
    /// # Errors
    /// `HttpError::Json` if `body` does not serialize.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        self.headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Send once. A non-2xx status is still `Ok` here.
    ///
    /// # Errors
    /// `UnsupportedUrl` for a host-less URL or a scheme the transport
    /// security forbids; `Timeout` and `Transport` for failed exchanges.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        let uri = checked_uri(&self.url, self.transport)?;
        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body.unwrap_or_default()))?;
        *request.headers_mut() = self.headers;

        let inner = self.service.oneshot(request).await?;
        Ok(HttpResponse::new(inner, self.body_limit))
    }
}

fn checked_uri(url: &Url, transport: TransportSecurity) -> Result<http::Uri, HttpError> {
    let reject = |reason| HttpError::UnsupportedUrl {
        url: url.to_string(),
        reason,
    };
    if url.host_str().is_none() {
        return Err(reject("no host"));
    }
    match (url.scheme(), transport) {
        ("https", _) | ("http", TransportSecurity::AllowInsecureHttp) => {}
        ("http", TransportSecurity::TlsOnly) => return Err(reject("plain HTTP is not allowed")),
        _ => return Err(reject("only http and https are supported")),
    }
    url.as_str()
        .parse()
        .map_err(|_| reject("not representable as an HTTP URI"))
}
