//! Extraction of authorization-relevant claims from a validated bearer token.
//!
//! The claim map handed to [`InboundClaims::extract`] has already passed
//! signature, issuer, audience, and expiry checks in the verifier; this module
//! only normalizes its shape. It performs no I/O.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// `appidacr` value that marks a token issued through the client-credentials
/// grant (app-only, no delegated user behind it).
pub const APP_ONLY_ACR: &str = "1";

/// Errors from claim extraction. The token is treated as unauthenticated,
/// not as a server fault.
#[derive(Debug, Error)]
pub enum MalformedClaimsError {
    #[error("token is missing a subject claim")]
    MissingSubject,
}

/// Normalized claim set for one request. Derived once per request from the
/// validated token and immutable afterwards.
#[derive(Debug, Clone)]
pub struct InboundClaims {
    /// The `sub` claim, used as the caller identity.
    pub subject: String,
    /// Scopes from `scp` plus app roles from `roles`.
    pub scopes: BTreeSet<String>,
    /// Group object IDs from the `groups` claim, empty when absent.
    pub groups: BTreeSet<String>,
    /// The `appidacr` claim when present; `"1"` signals an app-only token.
    pub app_id_acr: Option<String>,
    /// The raw compact JWT, kept only to serve as the OBO user assertion.
    /// Must never be logged or persisted.
    pub raw_token: String,
}

impl InboundClaims {
    /// Derive the normalized claim set from a validated claim map.
    pub fn extract(
        claims: &Map<String, Value>,
        raw_token: &str,
    ) -> Result<Self, MalformedClaimsError> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .ok_or(MalformedClaimsError::MissingSubject)?
            .to_string();

        // Delegated tokens carry a space-separated `scp`; app-only tokens
        // carry an array of app `roles`. Both feed the same scope mapping.
        let mut scopes = BTreeSet::new();
        if let Some(scp) = claims.get("scp").and_then(Value::as_str) {
            scopes.extend(scp.split_whitespace().map(str::to_string));
        }
        if let Some(roles) = claims.get("roles").and_then(Value::as_array) {
            scopes.extend(roles.iter().filter_map(Value::as_str).map(str::to_string));
        }

        let groups = claims
            .get("groups")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let app_id_acr = claims
            .get("appidacr")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            subject,
            scopes,
            groups,
            app_id_acr,
            raw_token: raw_token.to_string(),
        })
    }

    /// Whether the token was issued through the client-credentials grant.
    pub fn is_app_only(&self) -> bool {
        self.app_id_acr.as_deref() == Some(APP_ONLY_ACR)
    }
}
