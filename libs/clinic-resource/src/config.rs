use serde::{Deserialize, Serialize};

use crate::query::{DEFAULT_PAGE_SIZE, FlatKeys, QueryBuilder, QueryStyle};

/// Endpoint and encoding settings for a [`ResourceClient`](crate::ResourceClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceClientConfig {
    /// API root; resource names are appended as path segments
    pub base_url: String,
    pub query_style: QueryStyle,
    pub flat_keys: FlatKeys,
    pub default_page_size: u32,
    /// Emit `<base>/<resource>/` for collection requests (list, create)
    pub collection_trailing_slash: bool,
}

impl Default for ResourceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_owned(),
            query_style: QueryStyle::Canonical,
            flat_keys: FlatKeys::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            collection_trailing_slash: false,
        }
    }
}

impl ResourceClientConfig {
    /// Settings matching the clinic REST backend: flat params and
    /// trailing-slash collection routes.
    #[must_use]
    pub fn clinic_backend(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query_style: QueryStyle::Flat,
            collection_trailing_slash: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.query_style)
            .with_default_page_size(self.default_page_size)
            .with_flat_keys(self.flat_keys.clone())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResourceClientConfig::default();
        assert_eq!(config.query_style, QueryStyle::Canonical);
        assert_eq!(config.default_page_size, 10);
        assert!(!config.collection_trailing_slash);
    }

    #[test]
    fn deserializes_partial_yaml_like_json() {
        let config: ResourceClientConfig = serde_json::from_str(
            r#"{"base_url":"https://klinik.example.com/api","query_style":"flat"}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://klinik.example.com/api");
        assert_eq!(config.query_style, QueryStyle::Flat);
        assert_eq!(config.flat_keys, FlatKeys::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<ResourceClientConfig, _> =
            serde_json::from_str(r#"{"base_uri":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn clinic_backend_preset() {
        let config = ResourceClientConfig::clinic_backend("http://localhost:8080/api");
        assert!(config.collection_trailing_slash);
        assert_eq!(config.query_builder().style(), QueryStyle::Flat);
    }
}
