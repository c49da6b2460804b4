use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::SecretString;

/// Source of the bearer credential attached to outbound requests.
///
/// Read on every request. `None` means "send the request unauthenticated";
/// implementations must never block waiting for a token to appear.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<SecretString>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn token(&self) -> Option<SecretString> {
        (**self).token()
    }
}

/// Never supplies a credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredential;

impl CredentialProvider for NoCredential {
    fn token(&self) -> Option<SecretString> {
        None
    }
}

/// Fixed credential, e.g. a token passed on the command line.
#[derive(Debug, Clone)]
pub struct StaticCredential(SecretString);

impl StaticCredential {
    #[must_use]
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticCredential {
    fn token(&self) -> Option<SecretString> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Authenticated session returned by the login endpoint.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub email: String,
    pub role: String,
}

/// Shared, swappable session slot.
///
/// Clones share the same slot. The login flow writes it; request paths only
/// read it, lock-free.
#[derive(Debug, Clone, Default)]
pub struct SessionCredential {
    current: Arc<ArcSwapOption<Session>>,
}

impl SessionCredential {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, session: Session) {
        self.current.store(Some(Arc::new(session)));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_some()
    }
}

impl CredentialProvider for SessionCredential {
    fn token(&self) -> Option<SecretString> {
        (*self.current.load())
            .as_ref()
            .map(|session| session.token.clone())
    }
}
