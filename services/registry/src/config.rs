//! Registry configuration

use http::Uri;
use serde::Deserialize;
use storage::StorageConfig;

use crate::api::{Registry, RegistryBuilder};
use crate::error::{RegistryError, RegistryResult};

/// Configuration for a registry
///
/// ```toml
/// [storage]
/// driver = "local"
/// path = "/var/lib/registry"
///
/// [[proxies]]
/// url = "https://registry-1.docker.io/"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Local storage backend
    pub storage: StorageConfig,

    /// Upstream registries to read through, in order
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,
}

/// An upstream registry
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of the registry
    #[serde(with = "api_client::uri::serde")]
    pub url: Uri,
}

impl RegistryConfig {
    /// Parse a TOML document
    pub fn from_toml(document: &str) -> RegistryResult<Self> {
        toml_edit::de::from_str(document).map_err(|err| RegistryError::Config(err.to_string()))
    }

    /// Build the configured registry
    pub async fn build(self) -> RegistryResult<Registry> {
        let storage = self.storage.build().await?;
        let builder = self
            .proxies
            .into_iter()
            .fold(RegistryBuilder::new(storage), |builder, proxy| {
                builder.proxy(api_client::ApiClient::new(proxy.url))
            });
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::Docker as _;
    use crate::page::Limit;

    #[test]
    fn parse_config() {
        let config = RegistryConfig::from_toml(
            r#"
            [storage]
            driver = "local"
            path = "/var/lib/registry"

            [[proxies]]
            url = "https://registry-1.docker.io/"

            [[proxies]]
            url = "https://mirror.gcr.io/"
            "#,
        )
        .unwrap();

        assert!(matches!(config.storage, StorageConfig::Local { ref path } if path == "/var/lib/registry"));
        let hosts: Vec<_> = config
            .proxies
            .iter()
            .map(|proxy| proxy.url.host().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(hosts, ["registry-1.docker.io", "mirror.gcr.io"]);
    }

    #[test]
    fn invalid_config() {
        let err = RegistryConfig::from_toml("[storage]\ndriver = \"tape\"").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[tokio::test]
    async fn build_memory_registry() {
        let config = RegistryConfig::from_toml("[storage]\ndriver = \"memory\"").unwrap();
        assert!(config.proxies.is_empty());

        let registry = config.build().await.unwrap();
        let catalog = registry.catalog(None, Limit::Unbounded).await.unwrap();
        assert!(catalog.repositories().is_empty());
    }
}
