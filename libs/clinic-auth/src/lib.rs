#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Credentials for the clinic console.
//!
//! - [`CredentialProvider`]: per-request source of an optional bearer token
//! - [`BearerAuthLayer`] / [`HttpClientBuilderExt`]: inject it into `clinic-http`
//! - [`LoginClient`]: the login flow that fills a [`SessionCredential`]
//! - [`SessionClaims`]: unverified peek at the token payload

mod builder_ext;
mod claims;
mod error;
mod layer;
mod login;
mod provider;
mod secret;

pub use builder_ext::HttpClientBuilderExt;
pub use claims::SessionClaims;
pub use error::{ClaimsError, LoginError};
pub use layer::{BearerAuthLayer, BearerAuthService};
pub use login::{LoginClient, RegisterRequest, RegisteredUser};
pub use provider::{CredentialProvider, NoCredential, Session, SessionCredential, StaticCredential};
pub use secret::SecretString;
