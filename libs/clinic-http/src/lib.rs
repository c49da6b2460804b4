#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the clinic console.
//!
//! One pooled hyper client behind a tower stack: an optional auth layer
//! slot (filled by `clinic-auth`), a per-request timeout, a default
//! User-Agent and response decompression. TLS is rustls and HTTPS-only
//! unless plain HTTP is explicitly allowed. Each request is sent once;
//! retries and caching belong to callers.
//!
//! ```ignore
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//! let url = Url::parse("https://klinik.example.com/api/patients/?page=1")?;
//! let page: serde_json::Value = client.get(url).send().await?.json().await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;
mod tls;

pub use builder::{HttpClientBuilder, InnerService};
pub use client::HttpClient;
pub use config::{
    DEFAULT_USER_AGENT, HttpClientConfig, PoolConfig, TlsRootConfig, TransportSecurity,
};
pub use error::HttpError;
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
