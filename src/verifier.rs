//! Inbound bearer-token validation.
//!
//! Signature, issuer, audience, and expiry are checked here, before any
//! claim reaches the authorization or exchange code. Downstream modules
//! consume only the verified claim map and never talk to this boundary.
//!
//! Two schemes are supported: RS256 against the tenant's published JWKS
//! (production) and HS256 with a shared secret (tests and local runs).
//! Every claim map this module returns has passed signature validation;
//! there is no unverified decode path.

use crate::config::{GatewayConfig, VerifierMode};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// How long fetched JWKS documents are trusted before a re-fetch
const JWKS_TTL: Duration = Duration::from_secs(3600);

/// Errors from bearer-token validation. All of them map to 401 at the HTTP
/// boundary; messages never include token contents.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token header is missing a key id")]
    MissingKeyId,
    #[error("no signing key matches kid {0}")]
    UnknownKey(String),
    #[error("failed to fetch signing keys: {0}")]
    Jwks(#[from] reqwest::Error),
}

/// Validates inbound bearer tokens with the scheme selected at startup
#[derive(Clone)]
pub enum TokenVerifier {
    Jwks(JwksVerifier),
    Hmac(HmacVerifier),
}

impl TokenVerifier {
    /// Build the verifier selected by the configuration. The issuer defaults
    /// to the tenant's v2.0 issuer derived from the authority settings.
    pub fn from_config(config: &GatewayConfig, http: reqwest::Client) -> Self {
        let issuer = if config.verifier.issuer.is_empty() {
            format!("{}v2.0", config.azure.authority())
        } else {
            config.verifier.issuer.clone()
        };

        match config.verifier.mode {
            VerifierMode::Hmac => Self::Hmac(HmacVerifier::new(
                &config.verifier.hmac_secret,
                &issuer,
                &config.verifier.audience,
                config.verifier.leeway,
            )),
            VerifierMode::Jwks => Self::Jwks(JwksVerifier::new(
                http,
                format!("{}discovery/v2.0/keys", config.azure.authority()),
                &issuer,
                &config.verifier.audience,
                config.verifier.leeway,
            )),
        }
    }

    /// Validate a compact JWT and return its claim map
    pub async fn verify(&self, token: &str) -> Result<Map<String, Value>, VerifyError> {
        match self {
            Self::Jwks(verifier) => verifier.verify(token).await,
            Self::Hmac(verifier) => verifier.verify(token),
        }
    }
}

fn build_validation(algorithm: Algorithm, issuer: &str, audience: &str, leeway: u64) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.leeway = leeway;
    validation.set_issuer(&[issuer]);
    if audience.is_empty() {
        validation.validate_aud = false;
    } else {
        validation.set_audience(&[audience]);
    }
    validation
}

#[derive(Clone)]
struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// RS256 verification against the tenant's JWKS endpoint. Keys are cached
/// and re-fetched on expiry or when a token references an unknown `kid`
/// (key rotation).
#[derive(Clone)]
pub struct JwksVerifier {
    http: reqwest::Client,
    jwks_url: String,
    validation: Validation,
    keys: Arc<RwLock<Option<CachedJwks>>>,
}

impl JwksVerifier {
    pub fn new(
        http: reqwest::Client,
        jwks_url: String,
        issuer: &str,
        audience: &str,
        leeway: u64,
    ) -> Self {
        Self {
            http,
            jwks_url,
            validation: build_validation(Algorithm::RS256, issuer, audience, leeway),
            keys: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Map<String, Value>, VerifyError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;

        let jwks = self.current_jwks().await?;
        let decoding_key = match jwks.find(&kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)?,
            None => {
                // Unknown kid: the tenant may have rotated keys, retry once
                // with a fresh JWKS before rejecting
                let jwks = self.refresh_jwks().await?;
                let jwk = jwks.find(&kid).ok_or(VerifyError::UnknownKey(kid))?;
                DecodingKey::from_jwk(jwk)?
            }
        };

        let data = decode::<Map<String, Value>>(token, &decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    async fn current_jwks(&self) -> Result<JwkSet, VerifyError> {
        if let Some(cached) = self.keys.read().await.as_ref() {
            if cached.fetched_at.elapsed() < JWKS_TTL {
                return Ok(cached.jwks.clone());
            }
        }
        self.refresh_jwks().await
    }

    async fn refresh_jwks(&self) -> Result<JwkSet, VerifyError> {
        debug!("fetching JWKS from {}", self.jwks_url);
        let jwks: JwkSet = self.http.get(&self.jwks_url).send().await?.json().await?;
        *self.keys.write().await = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }
}

/// HS256 verification with a shared secret
#[derive(Clone)]
pub struct HmacVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl HmacVerifier {
    pub fn new(secret: &str, issuer: &str, audience: &str, leeway: u64) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: build_validation(Algorithm::HS256, issuer, audience, leeway),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, VerifyError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}
