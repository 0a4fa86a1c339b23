use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// In-memory cache sized by serialized entry weight. Entries expire after
/// the configured TTL; the exchange layer additionally drops entries whose
/// token expiry is closer than its reuse margin.
#[derive(Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, String>,
}

impl InMemoryCache {
    /// Initialize a new in-memory cache instance
    pub fn new(ttl_secs: u64, capacity_mib: usize) -> Result<Self, String> {
        let max_capacity_bytes: u64 = (capacity_mib * 1024 * 1024)
            .try_into()
            .map_err(|_| "cache capacity overflow".to_string())?;

        let cache = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .weigher(|_key, value: &String| -> u32 {
                value.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self { cache })
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        self.cache.insert(key.to_string(), serialized).await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        if let Some(value) = self.cache.get(key).await {
            serde_json::from_str(&value)
                .map_err(|e| CacheError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestEntry {
        token: String,
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new(60, 16).unwrap();
        let entry = TestEntry {
            token: "tok".to_string(),
        };

        cache.set("k1", &entry).await.unwrap();
        let fetched: TestEntry = cache.get("k1").await.unwrap().unwrap();
        assert_eq!(entry, fetched);

        cache.delete("k1").await.unwrap();
        assert!(cache.get::<TestEntry>("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = InMemoryCache::new(1, 16).unwrap();
        let entry = TestEntry {
            token: "tok".to_string(),
        };

        cache.set("k1", &entry).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(cache.get::<TestEntry>("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let cache = InMemoryCache::new(60, 16).unwrap();
        assert!(cache.health_check().await.is_ok());
    }
}
