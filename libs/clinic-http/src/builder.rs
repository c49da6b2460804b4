use std::time::Duration;

use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderValue, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use tower_http::set_header::SetRequestHeaderLayer;

use crate::HttpClient;
use crate::config::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use crate::error::HttpError;
use crate::response::ResponseBody;
use crate::tls;

/// The type-erased request service. An auth layer receives and returns one.
pub type InnerService =
    BoxCloneSyncService<http::Request<Full<Bytes>>, http::Response<ResponseBody>, HttpError>;

type AuthWrap = Box<dyn FnOnce(InnerService) -> InnerService + Send>;

/// Assembles an [`HttpClient`].
///
/// Request flow, outermost first:
/// `[auth] → timeout → user agent → decompression → hyper`.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    auth: Option<AuthWrap>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self { config, auth: None }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sent on requests that carry no User-Agent of their own.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.config.body_limit = bytes;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    #[must_use]
    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// Shorthand for `.transport(TransportSecurity::AllowInsecureHttp)`.
    ///
    /// Debug builds only, unless the `allow-insecure-http` feature is on.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(self) -> Self {
        self.transport(TransportSecurity::AllowInsecureHttp)
    }

    /// Install the outermost layer. A second call replaces the first.
    #[must_use]
    pub fn with_auth_layer(
        mut self,
        wrap: impl FnOnce(InnerService) -> InnerService + Send + 'static,
    ) -> Self {
        self.auth = Some(Box::new(wrap));
        self
    }

    /// # Errors
    /// `HttpError::Tls` if no root certificates are usable,
    /// `HttpError::InvalidHeader` if the user agent is not a valid header value.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let Self { config, auth } = self;
        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                target: "clinic_http::security",
                "plain HTTP allowed; traffic to http:// backends is not encrypted"
            );
        }

        let mut service = stack(&config)?;
        if let Some(wrap) = auth {
            service = wrap(service);
        }

        Ok(HttpClient {
            service,
            body_limit: config.body_limit,
            transport: config.transport,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything below the auth slot.
///
/// A non-2xx status is not an error here; see
/// [`HttpResponse::checked_bytes`](crate::HttpResponse::checked_bytes).
fn stack(config: &HttpClientConfig) -> Result<InnerService, HttpError> {
    let connector = tls::https_connector(config.tls_roots, config.transport)?;

    let mut pool = Client::builder(TokioExecutor::new());
    // idle_timeout needs a timer to fire
    pool.pool_timer(TokioTimer::new())
        .pool_max_idle_per_host(config.pool.max_idle_per_host)
        .pool_idle_timeout(config.pool.idle_timeout);
    let hyper = pool.build::<_, Full<Bytes>>(connector);

    let user_agent = HeaderValue::from_str(&config.user_agent)?;
    let timeout = config.request_timeout;

    let service = ServiceBuilder::new()
        .layer(TimeoutLayer::new(timeout))
        .layer(SetRequestHeaderLayer::if_not_present(USER_AGENT, user_agent))
        .layer(DecompressionLayer::new())
        .service(hyper)
        .map_response(box_body)
        .map_err(move |err: tower::BoxError| HttpError::from_stack(err, timeout));

    Ok(BoxCloneSyncService::new(service))
}

fn box_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<tower::BoxError>,
{
    response.map(|body| body.map_err(Into::into).boxed())
}
