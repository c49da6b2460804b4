use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clinic_auth::SecretString;
use clinic_http::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use clinic_resource::ResourceClientConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment prefix; `CLINIC__API__BASE_URL` maps to `api.base_url`.
pub const ENV_PREFIX: &str = "CLINIC__";

/// Effective console configuration.
///
/// Layers: defaults, then the YAML file given with `--config`, then
/// `CLINIC__*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub api: ResourceClientConfig,
    pub http: HttpSettings,
    pub logging: LoggingConfig,
    /// Bearer token for API calls; never printed
    #[serde(skip_serializing)]
    pub token: Option<SecretString>,
    /// Default account for `login`
    pub email: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ResourceClientConfig::clinic_backend("http://localhost:8080/api"),
            http: HttpSettings::default(),
            logging: LoggingConfig::default(),
            token: None,
            email: None,
        }
    }
}

impl ConsoleConfig {
    /// # Errors
    /// Fails if the file is missing or a layer does not match the schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    /// # Errors
    /// Only if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to render configuration")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsRoots {
    #[default]
    Webpki,
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    #[serde(with = "crate::humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Needed for `http://` backends such as a local dev server
    pub allow_insecure_http: bool,
    pub tls_roots: TlsRoots,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            request_timeout: defaults.request_timeout,
            user_agent: concat!("clinic-console/", env!("CARGO_PKG_VERSION")).to_owned(),
            allow_insecure_http: false,
            tls_roots: TlsRoots::Webpki,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            request_timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
            transport: if self.allow_insecure_http {
                TransportSecurity::AllowInsecureHttp
            } else {
                TransportSecurity::TlsOnly
            },
            tls_roots: match self.tls_roots {
                TlsRoots::Webpki => TlsRootConfig::WebPki,
                TlsRoots::Native => TlsRootConfig::Native,
            },
            ..HttpClientConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: LogFormat::Text,
        }
    }
}
