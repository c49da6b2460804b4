use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use clinic_http::HttpError;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};

use crate::CredentialProvider;

/// Tower layer that sets `Authorization: Bearer <token>` whenever the
/// provider holds a token, and forwards the request untouched otherwise.
#[derive(Clone)]
pub struct BearerAuthLayer {
    provider: Arc<dyn CredentialProvider>,
}

impl BearerAuthLayer {
    #[must_use]
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self { provider }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            provider: Arc::clone(&self.provider),
        }
    }
}

/// Created by [`BearerAuthLayer`].
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    provider: Arc<dyn CredentialProvider>,
}

impl<S, B, ResBody> Service<Request<B>> for BearerAuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // Read once per request: a login or logout between requests takes effect immediately
        if let Some(secret) = self.provider.token() {
            let raw = zeroize::Zeroizing::new(format!("Bearer {}", secret.expose()));
            let mut value = match HeaderValue::from_str(&raw) {
                Ok(v) => v,
                Err(e) => return Box::pin(async { Err(HttpError::InvalidHeader(e)) }),
            };
            value.set_sensitive(true);
            req.headers_mut().insert(AUTHORIZATION, value);
        }

        // Clone-swap: the instance polled ready is the one that gets called
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{NoCredential, SessionCredential, StaticCredential};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Echoes the received Authorization header back as the response body.
    #[derive(Clone)]
    struct EchoAuthService;

    impl Service<Request<Full<Bytes>>> for EchoAuthService {
        type Response = Response<Option<String>>;
        type Error = HttpError;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let auth = req
                .headers()
                .get(AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_owned());
            let mut resp = Response::new(auth);
            *resp.status_mut() = StatusCode::OK;
            std::future::ready(Ok(resp))
        }
    }

    fn request() -> Request<Full<Bytes>> {
        Request::builder()
            .uri("http://localhost:8080/api/patients/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn seen_auth(provider: Arc<dyn CredentialProvider>) -> Option<String> {
        let svc = BearerAuthLayer::new(provider).layer(EchoAuthService);
        svc.oneshot(request()).await.unwrap().into_body()
    }

    #[tokio::test]
    async fn injects_bearer_when_token_present() {
        let seen = seen_auth(Arc::new(StaticCredential::new("tok-123"))).await;
        assert_eq!(seen.as_deref(), Some("Bearer tok-123"));
    }

    #[tokio::test]
    async fn passes_through_without_token() {
        assert_eq!(seen_auth(Arc::new(NoCredential)).await, None);
    }

    #[tokio::test]
    async fn follows_session_changes_between_requests() {
        let session = SessionCredential::new();
        let svc = BearerAuthLayer::new(Arc::new(session.clone())).layer(EchoAuthService);

        let first = svc.clone().oneshot(request()).await.unwrap().into_body();
        assert_eq!(first, None);

        session.store(crate::Session {
            token: crate::SecretString::new("fresh"),
            email: "staff@klinik.id".to_owned(),
            role: "staff".to_owned(),
        });
        let second = svc.oneshot(request()).await.unwrap().into_body();
        assert_eq!(second.as_deref(), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn invalid_token_is_header_error() {
        let svc = BearerAuthLayer::new(Arc::new(StaticCredential::new("bad\ntoken")))
            .layer(EchoAuthService);
        let result = svc.oneshot(request()).await;
        assert!(matches!(result, Err(HttpError::InvalidHeader(_))));
    }
}
