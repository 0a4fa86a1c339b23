//! On-Behalf-Of and client-credentials token acquisition against the
//! authority's OAuth2 token endpoint.
//!
//! A [`ConfidentialClient`] is a request-scoped context built fresh per call
//! from the process-wide credentials. That costs a little construction work
//! on every exchange but no authority metadata or tenant state can leak
//! between requests. Neither the user assertion nor the acquired access token
//! is ever logged; only scope names and expiry timestamps are.

pub mod cached;

use crate::config::AzureConfig;
use crate::errors::ApiError;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const OBO_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Errors from token acquisition. None of these are retried here; retry
/// policy belongs to the caller, and only `Transport` is safe to retry at
/// all (repeating an exchange with the same rejected assertion cannot
/// succeed).
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Malformed credentials or scope, detected before any network call
    #[error("exchange configuration error: {0}")]
    Configuration(String),
    /// The authority rejected the token request; carries the authority's
    /// error code and description verbatim
    #[error("authority rejected the token request: {error}: {description}")]
    Authority { error: String, description: String },
    /// Network-level failure reaching the authority
    #[error("failed to reach the authority: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Configuration(detail) => {
                ApiError::internal(format!("exchange configuration error: {detail}"))
            }
            ExchangeError::Authority { .. } => {
                ApiError::bad_gateway(format!("token exchange failed: {err}"))
            }
            ExchangeError::Transport(e) if e.is_timeout() => {
                ApiError::gateway_timeout("timed out waiting for the authority")
            }
            ExchangeError::Transport(_) => ApiError::bad_gateway("failed to reach the authority"),
        }
    }
}

/// Result of a successful token acquisition. The access token is valid for
/// exactly the scope it was requested with and must not be reused for any
/// other resource. Serializable only so the opt-in cache layer can store it;
/// it must never appear in logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Success payload of the OAuth2 v2.0 token endpoint
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
}

/// Error payload of the OAuth2 v2.0 token endpoint
#[derive(Debug, Deserialize)]
struct TokenEndpointError {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Request-scoped confidential-client context for one authority tenant.
pub struct ConfidentialClient<'a> {
    credentials: &'a AzureConfig,
    http: &'a Client,
    token_url: String,
}

impl<'a> ConfidentialClient<'a> {
    /// Build a confidential-client context from the process credentials.
    /// All four credential fields must be non-empty; validation happens here,
    /// before any network traffic.
    pub fn new(credentials: &'a AzureConfig, http: &'a Client) -> Result<Self, ExchangeError> {
        for (field, value) in [
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("tenant_id", &credentials.tenant_id),
            ("required_group_id", &credentials.required_group_id),
        ] {
            if value.is_empty() {
                return Err(ExchangeError::Configuration(format!(
                    "credential field {field} is empty"
                )));
            }
        }

        let token_url = format!("{}oauth2/v2.0/token", credentials.authority());
        Ok(Self {
            credentials,
            http,
            token_url,
        })
    }

    /// Acquire a downstream token on behalf of the inbound user (OBO flow).
    /// `user_assertion` is the raw inbound access token; `target_scope` is a
    /// resource scope such as `"https://resource/.default"`.
    pub async fn acquire_on_behalf_of(
        &self,
        user_assertion: &str,
        target_scope: &str,
    ) -> Result<ExchangeResult, ExchangeError> {
        if user_assertion.is_empty() {
            return Err(ExchangeError::Configuration(
                "user assertion is empty".to_string(),
            ));
        }
        validate_scope(target_scope)?;

        let params = [
            ("grant_type", OBO_GRANT_TYPE),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("assertion", user_assertion),
            ("scope", target_scope),
            ("requested_token_use", "on_behalf_of"),
        ];

        let result = self.request_token(&params).await?;
        info!(
            "acquired delegated token for scope {} exp: {}",
            target_scope, result.expires_at
        );
        Ok(result)
    }

    /// Acquire a token using client credentials only (app-only).
    pub async fn acquire_for_client(
        &self,
        scopes: &[String],
    ) -> Result<ExchangeResult, ExchangeError> {
        if scopes.is_empty() {
            return Err(ExchangeError::Configuration(
                "no scopes requested".to_string(),
            ));
        }
        for scope in scopes {
            validate_scope(scope)?;
        }
        let scope = scopes.join(" ");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let result = self.request_token(&params).await?;
        info!(
            "acquired app-only token for scopes {} exp: {}",
            scope, result.expires_at
        );
        Ok(result)
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
    ) -> Result<ExchangeResult, ExchangeError> {
        debug!("requesting token from {}", self.token_url);
        let response = self.http.post(&self.token_url).form(params).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // Propagate the authority's error payload verbatim; a generic
            // message would hide why the assertion was rejected.
            let payload: TokenEndpointError =
                serde_json::from_slice(&body).unwrap_or_else(|_| TokenEndpointError {
                    error: format!("http_{}", status.as_u16()),
                    error_description: String::from_utf8_lossy(&body).into_owned(),
                });
            return Err(ExchangeError::Authority {
                error: payload.error,
                description: payload.error_description,
            });
        }

        let token: TokenEndpointResponse = serde_json::from_slice(&body).map_err(|e| {
            ExchangeError::Authority {
                error: "invalid_response".to_string(),
                description: format!("authority returned an unparseable token response: {e}"),
            }
        })?;

        Ok(ExchangeResult {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

fn validate_scope(scope: &str) -> Result<(), ExchangeError> {
    if scope.is_empty() {
        return Err(ExchangeError::Configuration(
            "target scope is empty".to_string(),
        ));
    }
    if !scope.contains("://") {
        return Err(ExchangeError::Configuration(format!(
            "target scope {scope} is not a resource URI"
        )));
    }
    Ok(())
}
