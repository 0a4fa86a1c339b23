//! Downstream exchange targets and HTTP client timeouts

use confique::Config;

/// Scopes and URLs of the downstream resource APIs, plus the timeouts applied
/// to every outbound call. A hung authority or resource API fails the request
/// after `client_timeout` instead of pinning a worker.
#[derive(Debug, Config, Clone)]
pub struct ExchangeConfig {
    /// Request timeout in seconds for authority and downstream calls
    #[config(env = "OBO_EXCHANGE_CLIENT_TIMEOUT", default = 10)]
    pub client_timeout: u64,

    /// Connect timeout in seconds
    #[config(env = "OBO_EXCHANGE_CONNECT_TIMEOUT", default = 2)]
    pub connect_timeout: u64,

    /// Scope the external hello API expects
    #[config(
        env = "OBO_EXCHANGE_EXTERNAL_HELLO_SCOPE",
        default = "api://external-hello-api/.default"
    )]
    pub external_hello_scope: String,

    /// URL of the external hello API
    #[config(
        env = "OBO_EXCHANGE_EXTERNAL_HELLO_URL",
        default = "https://example.com/hello"
    )]
    pub external_hello_url: String,

    /// Scope the Power BI REST API expects
    #[config(
        env = "OBO_EXCHANGE_POWERBI_SCOPE",
        default = "https://analysis.windows.net/powerbi/api/.default"
    )]
    pub powerbi_scope: String,

    /// Base URL of the Power BI REST API
    #[config(
        env = "OBO_EXCHANGE_POWERBI_API_URL",
        default = "https://api.powerbi.com"
    )]
    pub powerbi_api_url: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            client_timeout: 10,
            connect_timeout: 2,
            external_hello_scope: "api://external-hello-api/.default".to_string(),
            external_hello_url: "https://example.com/hello".to_string(),
            powerbi_scope: "https://analysis.windows.net/powerbi/api/.default".to_string(),
            powerbi_api_url: "https://api.powerbi.com".to_string(),
        }
    }
}
