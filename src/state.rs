use crate::cache::{create_cache, Cache, CacheBackend};
use crate::config::GatewayConfig;
use crate::verifier::TokenVerifier;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state. Everything here is read-only after startup and
/// safely shareable across concurrent requests; per-request exchange contexts
/// borrow from it instead of holding their own connections.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub cache: Arc<Cache>,
    pub verifier: Arc<TokenVerifier>,
    /// Transport for token-endpoint and JWKS calls to the authority
    pub authority_client: Arc<Client>,
    /// Transport for bearer-authenticated calls to downstream resource APIs
    pub downstream_client: Arc<Client>,
}

impl AppState {
    fn create_http_client(timeout: u64, connect_timeout: u64) -> Result<Client, std::io::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(connect_timeout))
            .default_headers(headers)
            // Keep a small pool of warm connections to the authority and
            // downstream hosts
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| std::io::Error::other(format!("Failed to create HTTP client: {e}")))
    }

    pub fn new(config: GatewayConfig) -> Result<Self, std::io::Error> {
        let cache = create_cache(&config.cache)
            .map_err(|e| std::io::Error::other(format!("Failed to create cache: {e}")))?;
        let authority_client = Self::create_http_client(
            config.exchange.client_timeout,
            config.exchange.connect_timeout,
        )?;
        let downstream_client = Self::create_http_client(
            config.exchange.client_timeout,
            config.exchange.connect_timeout,
        )?;
        let verifier = TokenVerifier::from_config(&config, authority_client.clone());

        Ok(Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
            verifier: Arc::new(verifier),
            authority_client: Arc::new(authority_client),
            downstream_client: Arc::new(downstream_client),
        })
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        self.cache.health_check().await.is_ok()
    }

    #[cfg(test)]
    pub(crate) fn for_testing(config: &GatewayConfig) -> Self {
        Self::new(config.clone()).expect("Failed to create test state")
    }
}
