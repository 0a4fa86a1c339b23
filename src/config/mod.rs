pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
pub(crate) use crate::config::azure::AzureConfig;
pub(crate) use crate::config::exchange::ExchangeConfig;
use confique::Config;
use serde::Deserialize;

pub mod azure;
pub mod cache;
pub mod exchange;

/// Main configuration structure for the OBO gateway
#[derive(Debug, Config, Clone)]
pub struct GatewayConfig {
    /// The port the gateway will listen on (default: 7788)
    #[config(env = "OBO_PORT", default = 7788)]
    pub port: u16,

    /// Azure credentials and authority settings
    #[config(nested)]
    pub azure: AzureConfig,

    /// Downstream exchange targets and client timeouts
    #[config(nested)]
    pub exchange: ExchangeConfig,

    /// Exchanged-token cache settings
    #[config(nested)]
    pub cache: CacheConfig,

    /// Inbound token verification settings
    #[config(nested)]
    pub verifier: VerifierConfig,
}

/// Which signature scheme validates inbound bearer tokens
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VerifierMode {
    /// RS256 against the tenant's published JWKS (production)
    #[default]
    Jwks,
    /// HS256 with a shared secret (tests and local development)
    Hmac,
}

/// Inbound token verification settings
#[derive(Debug, Config, Clone)]
pub struct VerifierConfig {
    /// Verification mode: "jwks" (default) or "hmac"
    #[config(env = "OBO_VERIFIER_MODE", default = "jwks")]
    pub mode: VerifierMode,

    /// Shared secret for hmac mode. Ignored in jwks mode.
    #[config(env = "OBO_VERIFIER_HMAC_SECRET", default = "")]
    pub hmac_secret: String,

    /// Expected issuer; empty derives the tenant's v2.0 issuer from the
    /// authority settings
    #[config(env = "OBO_VERIFIER_ISSUER", default = "")]
    pub issuer: String,

    /// Expected audience; empty disables the audience check
    #[config(env = "OBO_VERIFIER_AUDIENCE", default = "")]
    pub audience: String,

    /// Allowed clock skew in seconds for expiry validation
    #[config(env = "OBO_VERIFIER_LEEWAY", default = 60)]
    pub leeway: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: VerifierMode::Jwks,
            hmac_secret: String::new(),
            issuer: String::new(),
            audience: String::new(),
            leeway: 60,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 7788,
            azure: AzureConfig::default(),
            exchange: ExchangeConfig::default(),
            cache: CacheConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load the configuration from environment variables
    pub fn from_env() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(
        authority_mock: &wiremock::MockServer,
        downstream_mock: &wiremock::MockServer,
    ) -> Self {
        use crate::test_utils::{TEST_AUDIENCE, TEST_HMAC_SECRET, TEST_ISSUER};

        Self {
            port: 0, // Let the OS choose a port
            azure: AzureConfig {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                tenant_id: "test-tenant".to_string(),
                required_group_id: "g1".to_string(),
                authority_url: authority_mock.uri(),
            },
            exchange: ExchangeConfig {
                client_timeout: 5,
                connect_timeout: 2,
                external_hello_url: format!("{}/hello", downstream_mock.uri()),
                powerbi_api_url: downstream_mock.uri(),
                ..Default::default()
            },
            cache: CacheConfig {
                ttl: 60,
                store: CacheStore::None,
                capacity: 128,
            },
            verifier: VerifierConfig {
                mode: VerifierMode::Hmac,
                hmac_secret: TEST_HMAC_SECRET.to_string(),
                issuer: TEST_ISSUER.to_string(),
                audience: TEST_AUDIENCE.to_string(),
                leeway: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 7788);
        assert_eq!(config.cache.ttl, 3600);
        assert_eq!(config.cache.store, CacheStore::None);
        assert_eq!(config.verifier.mode, VerifierMode::Jwks);
        assert_eq!(
            config.azure.authority_url,
            "https://login.microsoftonline.com"
        );
        assert_eq!(config.exchange.client_timeout, 10);
        assert_eq!(
            config.exchange.powerbi_scope,
            "https://analysis.windows.net/powerbi/api/.default"
        );
    }

    #[test]
    fn test_config_from_env() {
        // Clear any existing environment variables with our prefix
        for (name, _value) in std::env::vars() {
            if name.starts_with("OBO_") {
                std::env::remove_var(name);
            }
        }
        std::env::set_var("OBO_AZURE_CLIENT_ID", "c1");
        std::env::set_var("OBO_AZURE_TENANT_ID", "t1");
        std::env::set_var("OBO_CACHE_STORE", "in-memory");

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.azure.client_id, "c1");
        assert_eq!(config.azure.tenant_id, "t1");
        assert_eq!(config.cache.store, CacheStore::InMemory);
        assert_eq!(config.port, 7788);

        std::env::remove_var("OBO_AZURE_CLIENT_ID");
        std::env::remove_var("OBO_AZURE_TENANT_ID");
        std::env::remove_var("OBO_CACHE_STORE");
    }
}
