use std::time::Duration;

/// Sent when the caller configures no User-Agent of its own.
pub const DEFAULT_USER_AGENT: &str = concat!("clinic-http/", env!("CARGO_PKG_VERSION"));

/// Where trusted root certificates come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Bundled Mozilla roots (webpki-roots)
    #[default]
    WebPki,
    /// The operating system's certificate store
    Native,
}

/// Which URL schemes the client accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// `https://` only
    #[default]
    TlsOnly,
    /// `http://` as well, for a backend on `localhost:8080` or a mock server
    AllowInsecureHttp,
}

/// Connection pool tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// `None` keeps idle connections until the server closes them
    pub idle_timeout: Option<Duration>,
    pub max_idle_per_host: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(90)),
            max_idle_per_host: 16,
        }
    }
}

/// Settings for [`HttpClientBuilder::with_config`](crate::HttpClientBuilder::with_config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Bounds one whole exchange; there are no retries
    pub request_timeout: Duration,
    /// Largest decompressed response body accepted, in bytes
    pub body_limit: usize,
    pub user_agent: String,
    pub transport: TransportSecurity,
    pub tls_roots: TlsRootConfig,
    pub pool: PoolConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit: 4 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::WebPki,
            pool: PoolConfig::default(),
        }
    }
}

impl HttpClientConfig {
    /// Plain HTTP and a short timeout, for mock servers.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            transport: TransportSecurity::AllowInsecureHttp,
            ..Self::default()
        }
    }
}
