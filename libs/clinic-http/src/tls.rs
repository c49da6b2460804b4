//! Root store and connector setup.

use std::sync::{Arc, OnceLock};

use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::crypto::CryptoProvider;
use rustls_pki_types::CertificateDer;

use crate::config::{TlsRootConfig, TransportSecurity};
use crate::error::HttpError;

static NATIVE_ROOTS: OnceLock<Vec<CertificateDer<'static>>> = OnceLock::new();

/// OS roots, read once per process.
fn native_roots() -> &'static [CertificateDer<'static>] {
    NATIVE_ROOTS.get_or_init(|| {
        let loaded = rustls_native_certs::load_native_certs();
        for err in &loaded.errors {
            tracing::warn!(error = %err, "skipping unreadable native root certificate");
        }
        tracing::debug!(count = loaded.certs.len(), "native root certificates loaded");
        loaded.certs
    })
}

/// The installed process default, else aws-lc-rs.
fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

fn native_client_config() -> Result<rustls::ClientConfig, HttpError> {
    let mut store = rustls::RootCertStore::empty();
    let (added, ignored) = store.add_parsable_certificates(native_roots().iter().cloned());
    if ignored > 0 {
        tracing::warn!(added, ignored, "some native root certificates did not parse");
    }
    if added == 0 {
        return Err(HttpError::Tls("no usable root certificates in the OS store".into()));
    }

    Ok(rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| HttpError::Tls(Box::new(e)))?
        .with_root_certificates(store)
        .with_no_client_auth())
}

/// HTTPS connector speaking h2 and http/1.1; plain HTTP only when allowed.
///
/// # Errors
/// `HttpError::Tls` when the chosen root source yields no usable roots.
pub(crate) fn https_connector(
    roots: TlsRootConfig,
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let builder = match roots {
        TlsRootConfig::WebPki => hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(crypto_provider())
            .map_err(|e| HttpError::Tls(Box::new(e)))?,
        TlsRootConfig::Native => {
            hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(native_client_config()?)
        }
    };

    Ok(match transport {
        TransportSecurity::AllowInsecureHttp => builder.https_or_http().enable_all_versions().build(),
        TransportSecurity::TlsOnly => builder.https_only().enable_all_versions().build(),
    })
}
