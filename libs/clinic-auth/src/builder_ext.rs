use std::sync::Arc;

use tower::util::BoxCloneSyncService;

use crate::CredentialProvider;
use crate::layer::BearerAuthLayer;

/// Extension trait for adding bearer auth to [`clinic_http::HttpClientBuilder`].
///
/// ```ignore
/// use clinic_auth::{HttpClientBuilderExt, SessionCredential};
///
/// let session = SessionCredential::new();
/// let client = HttpClientBuilder::new()
///     .with_credentials(Arc::new(session.clone()))
///     .build()?;
/// ```
pub trait HttpClientBuilderExt {
    /// Inject `Authorization: Bearer <token>` whenever `provider` holds a token.
    #[must_use]
    fn with_credentials(self, provider: Arc<dyn CredentialProvider>) -> Self;
}

impl HttpClientBuilderExt for clinic_http::HttpClientBuilder {
    fn with_credentials(self, provider: Arc<dyn CredentialProvider>) -> Self {
        let layer = BearerAuthLayer::new(provider);
        self.with_auth_layer(move |svc| {
            BoxCloneSyncService::new(tower::ServiceBuilder::new().layer(layer).service(svc))
        })
    }
}
