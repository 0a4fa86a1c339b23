//! Opt-in cache wrapper around the exchange engine.
//!
//! Disabled by default (`OBO_CACHE_STORE=none`): every request then pays the
//! full exchange round-trip, which is the correctness-safe baseline. When
//! enabled, entries are keyed by client, a hash of the user assertion, and
//! the target scope, so a token acquired for one scope can never be served
//! for another resource. The raw assertion itself is never used as a key.

use super::{ConfidentialClient, ExchangeError, ExchangeResult};
use crate::cache::CacheBackend;
use crate::state::AppState;
use chrono::{Duration, Utc};
use log::{debug, warn};
use sha2::{Digest, Sha256};

/// Margin subtracted from the token expiry before a cached entry is reused.
/// Entries closer to expiry than this are dropped and re-acquired.
const EXPIRY_MARGIN_SECS: i64 = 30;

fn exchange_cache_key(client_id: &str, user_assertion: &str, target_scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_assertion.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("obo:{}:{}:{}", client_id, &hash[..16], target_scope)
}

/// OBO acquisition through the configured cache. On a miss (or with caching
/// disabled) this performs the full exchange and stores the result; cache
/// failures degrade to the uncached path rather than failing the request.
pub async fn acquire_on_behalf_of_cached(
    state: &AppState,
    user_assertion: &str,
    target_scope: &str,
) -> Result<ExchangeResult, ExchangeError> {
    let client = ConfidentialClient::new(&state.config.azure, &state.authority_client)?;
    let key = exchange_cache_key(&state.config.azure.client_id, user_assertion, target_scope);

    match state.cache.get::<ExchangeResult>(&key).await {
        Ok(Some(cached)) => {
            if cached.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) {
                debug!("exchange cache hit for scope {target_scope}");
                return Ok(cached);
            }
            debug!("cached token for scope {target_scope} is about to expire, dropping it");
            if let Err(e) = state.cache.delete(&key).await {
                warn!("failed to drop expiring cache entry: {e}");
            }
        }
        Ok(None) => debug!("exchange cache miss for scope {target_scope}"),
        Err(e) => warn!("exchange cache read failed for scope {target_scope}: {e}"),
    }

    let result = client
        .acquire_on_behalf_of(user_assertion, target_scope)
        .await?;

    if let Err(e) = state.cache.set(&key, &result).await {
        warn!("failed to cache exchanged token for scope {target_scope}: {e}");
    }
    Ok(result)
}
