use http::Method;
use url::Url;

use crate::builder::{HttpClientBuilder, InnerService};
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;

/// Pooled HTTP client. Clones share the pool and the middleware stack.
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: InnerService,
    pub(crate) body_limit: usize,
    pub(crate) transport: TransportSecurity,
}

impl HttpClient {
    /// HTTPS-only client with default settings.
    ///
    /// # Errors
    /// `HttpError::Tls` if no root certificates are usable.
    pub fn new() -> Result<Self, HttpError> {
        HttpClientBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// The query string, if any, travels inside `url`.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.body_limit,
            self.transport,
            method,
            url,
        )
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    #[must_use]
    pub fn transport(&self) -> TransportSecurity {
        self.transport
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("body_limit", &self.body_limit)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
