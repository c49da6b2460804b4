use clinic_http::HttpClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::{LoginError, SecretString, Session, SessionCredential};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a SecretString,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: SecretString,
    email: String,
    role: String,
}

/// New staff account submitted to `POST /users/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: SecretString,
    /// `admin`, `doctor` or `staff`
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    user: RegisteredUser,
}

/// Login flow: the only writer of a [`SessionCredential`].
///
/// Uses a plain (non-intercepted) client so a stale token is never sent to
/// the login endpoint.
#[derive(Clone)]
pub struct LoginClient {
    http: HttpClient,
    users_url: Url,
    session: SessionCredential,
}

impl LoginClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`.
    ///
    /// # Errors
    /// Returns `LoginError::InvalidUrl` if the users endpoint cannot be derived.
    pub fn new(
        http: HttpClient,
        base_url: &Url,
        session: SessionCredential,
    ) -> Result<Self, LoginError> {
        let mut root = base_url.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(Self {
            http,
            users_url: root.join("users/")?,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionCredential {
        &self.session
    }

    /// Authenticate and store the returned token in the shared session.
    ///
    /// # Errors
    /// Returns `LoginError::Http` with status 400/401 for rejected credentials,
    /// or transport/decoding failures.
    #[instrument(skip_all, fields(endpoint = "users/login"))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, LoginError> {
        let url = self.users_url.join("login")?;
        let resp: LoginResponse = self
            .http
            .post(url)
            .json(&LoginRequest { email, password })?
            .send()
            .await?
            .json()
            .await?;

        if resp.token.is_empty() {
            return Err(LoginError::EmptyToken);
        }

        let session = Session {
            token: resp.token,
            email: resp.email,
            role: resp.role,
        };
        self.session.store(session.clone());
        tracing::info!(role = %session.role, "login succeeded");
        Ok(session)
    }

    /// Create a user account. Does not change the current session.
    ///
    /// # Errors
    /// Returns `LoginError::Http` (400 when the email is already registered).
    #[instrument(skip_all, fields(endpoint = "users/register"))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser, LoginError> {
        let url = self.users_url.join("register")?;
        let resp: RegisterResponse = self
            .http
            .post(url)
            .json(request)?
            .send()
            .await?
            .json()
            .await?;
        tracing::info!(user_id = %resp.user.id, "user registered");
        Ok(resp.user)
    }

    /// Drop the stored session. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
    }
}
