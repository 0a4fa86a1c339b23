//! Azure AD (Entra ID) credentials and authority settings

use confique::Config;

/// Confidential-client credentials plus the group policy input. Loaded once
/// at startup and treated as read-only for the process lifetime; the exchange
/// engine borrows it per call and never copies the secret anywhere else.
#[derive(Debug, Config, Clone)]
pub struct AzureConfig {
    /// Application (client) ID of the confidential client
    #[config(env = "OBO_AZURE_CLIENT_ID", default = "")]
    pub client_id: String,

    /// Client secret of the confidential client. Never logged.
    #[config(env = "OBO_AZURE_CLIENT_SECRET", default = "")]
    pub client_secret: String,

    /// Directory (tenant) ID the authority endpoint is scoped to
    #[config(env = "OBO_AZURE_TENANT_ID", default = "")]
    pub tenant_id: String,

    /// Object ID of the group delegated callers must belong to
    #[config(env = "OBO_AZURE_REQUIRED_GROUP_ID", default = "")]
    pub required_group_id: String,

    /// Base URL of the authority (default: the public Entra ID endpoint)
    #[config(
        env = "OBO_AZURE_AUTHORITY_URL",
        default = "https://login.microsoftonline.com"
    )]
    pub authority_url: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            tenant_id: String::new(),
            required_group_id: String::new(),
            authority_url: "https://login.microsoftonline.com".to_string(),
        }
    }
}

impl AzureConfig {
    /// Tenant-scoped authority base, e.g.
    /// `https://login.microsoftonline.com/<tenant>/`
    pub fn authority(&self) -> String {
        format!(
            "{}/{}/",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_is_tenant_scoped() {
        let config = AzureConfig {
            tenant_id: "t1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.authority(),
            "https://login.microsoftonline.com/t1/"
        );
    }

    #[test]
    fn test_authority_trims_trailing_slash() {
        let config = AzureConfig {
            tenant_id: "t1".to_string(),
            authority_url: "http://127.0.0.1:9999/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.authority(), "http://127.0.0.1:9999/t1/");
    }
}
