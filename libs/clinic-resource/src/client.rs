use clinic_http::HttpClient;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ResourceClientConfig;
use crate::error::ResourceError;
use crate::page::{PageResult, decode_item, decode_list};
use crate::query::{QueryBuilder, QuerySpec, QueryString};

/// JSON request executor rooted at the configured API base.
///
/// Credentials are not handled here: pass an [`HttpClient`] built with an
/// auth layer and every request carries the bearer header.
#[derive(Clone)]
pub struct ResourceClient {
    http: HttpClient,
    base: Url,
    query: QueryBuilder,
    trailing_slash: bool,
}

impl std::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("base", &self.base.as_str())
            .field("query", &self.query)
            .field("trailing_slash", &self.trailing_slash)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    /// # Errors
    /// Returns `InvalidBaseUrl` if `config.base_url` does not parse, or
    /// `InvalidPath` if it cannot carry path segments (`mailto:` and friends).
    pub fn new(http: HttpClient, config: &ResourceClientConfig) -> Result<Self, ResourceError> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ResourceError::InvalidPath(format!(
                "base URL `{base}` has no path"
            )));
        }
        Ok(Self {
            http,
            base,
            query: config.query_builder(),
            trailing_slash: config.collection_trailing_slash,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[must_use]
    pub fn query_builder(&self) -> &QueryBuilder {
        &self.query
    }

    /// Resolve `segments` under the base URL.
    ///
    /// Each segment is percent-encoded on its own, so ids cannot inject path
    /// separators. A lone collection segment gets a trailing slash when
    /// configured.
    ///
    /// # Errors
    /// Returns `InvalidPath` for no segments, an empty segment, `.` or `..`.
    pub fn url(&self, segments: &[&str], query: Option<&QueryString>) -> Result<Url, ResourceError> {
        if segments.is_empty() {
            return Err(ResourceError::InvalidPath("no path segments".to_owned()));
        }
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ResourceError::InvalidPath(format!(
                "invalid segment `{bad}` in `{}`",
                segments.join("/")
            )));
        }

        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ResourceError::InvalidPath(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
            if self.trailing_slash && segments.len() == 1 {
                path.push("");
            }
        }
        url.set_query(query.filter(|q| !q.is_empty()).map(QueryString::as_str));
        Ok(url)
    }

    /// Send one JSON request and return the decoded body.
    ///
    /// An empty 2xx body is `Value::Null`.
    ///
    /// # Errors
    /// `Transport` when the backend is unreachable or times out,
    /// `HttpStatus` for any non-2xx answer, `Decoding` for a non-JSON body.
    #[instrument(skip_all, fields(method = %method, path = %segments.join("/")))]
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
        query: Option<&QueryString>,
    ) -> Result<Value, ResourceError> {
        let url = self.url(segments, query)?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body)?;
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.checked_bytes().await?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "response received");

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch one page of `resource` using the configured query style.
    ///
    /// # Errors
    /// See [`request`](Self::request); list envelope problems are `Decoding`.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        spec: &QuerySpec,
    ) -> Result<PageResult<T>, ResourceError> {
        self.list_with(&self.query, resource, spec).await
    }

    /// Like [`list`](Self::list) with a resource-specific query encoding.
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn list_with<T: DeserializeOwned>(
        &self,
        builder: &QueryBuilder,
        resource: &str,
        spec: &QuerySpec,
    ) -> Result<PageResult<T>, ResourceError> {
        let query = builder.build(spec);
        let body = self
            .request(Method::GET, &[resource], None, Some(&query))
            .await?;
        decode_list(body, spec.effective_page())
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub async fn get<T: DeserializeOwned>(&self, resource: &str, id: &str) -> Result<T, ResourceError> {
        let body = self.request(Method::GET, &[resource, id], None, None).await?;
        decode_item(body)
    }

    /// GET an arbitrary sub-path such as `appointments/appoinmentPatient/{id}`.
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn get_nested<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ResourceError> {
        let body = self.request(Method::GET, segments, None, None).await?;
        decode_item(body)
    }
}
