use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{PropertyFeatures, PropertyType};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 (in-memory) and L2 (Redis) caching for valuation results. L1 is
/// fastest but per-instance, L2 is shared across instances. Valuations
/// are pure over the comparable snapshot, so short TTLs only trade
/// freshness of newly crawled listings.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = value {
            tracing::trace!("L2 cache hit: {}", key);

            let bytes = json.as_bytes().to_vec();
            self.l1_cache.insert(key.to_string(), bytes).await;

            return Ok(serde_json::from_str(&json)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both L1 and L2)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        let bytes = json.as_bytes().to_vec();
        self.l1_cache.insert(key.to_string(), bytes).await;

        let mut conn = self.redis.lock().await;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        let mut conn = self.redis.lock().await;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }

    /// Invalidate all cache entries matching a pattern
    ///
    /// Used when a crawl batch lands and cached estimates go stale.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate_all();

        let mut conn = self.redis.lock().await;
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut *conn)
            .await?;

        if !keys.is_empty() {
            redis::cmd("DEL")
                .arg(keys)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::debug!("Invalidated cache pattern: {}", pattern);
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a valuation result. Coordinates are rounded to ~10m so
    /// repeat requests for the same property hit the cache. The search
    /// radius and a digest of the residential details are part of the key:
    /// both change the estimate, so they must never share an entry.
    pub fn valuation(features: &PropertyFeatures, lat: f64, lng: f64, radius_km: f64) -> String {
        let txn = features
            .transaction_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "any".to_string());
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(&features.details)
            .unwrap_or_default()
            .hash(&mut hasher);
        format!(
            "valuation:{}:{}:{:.4}:{:.4}:{:.1}:{:.1}:{:016x}",
            features.category(),
            txn,
            lat,
            lng,
            features.area,
            radius_km,
            hasher.finish()
        )
    }

    /// Pattern covering every valuation entry for one category.
    pub fn valuation_pattern(category: PropertyType) -> String {
        format!("valuation:{}:*", category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyDetails, TransactionType};

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "test_key";
        let value = "test_value";

        cache.set(key, &value).await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    fn flat(room_count: Option<u8>) -> PropertyFeatures {
        PropertyFeatures {
            area: 120.0,
            transaction_type: Some(TransactionType::Sale),
            details: PropertyDetails::Residential {
                room_count,
                building_age: Some(10),
                floor: Some(3),
                total_floors: Some(8),
                has_elevator: Some(true),
                has_parking: None,
                has_balcony: Some(true),
                heating: None,
                furnished: None,
            },
        }
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKey::valuation(&flat(Some(3)), 41.00824, 28.97836, 5.0);
        assert!(key.starts_with("valuation:residential:sale:41.0082:28.9784:120.0:5.0:"));

        let land = PropertyFeatures {
            area: 500.0,
            transaction_type: None,
            details: PropertyDetails::Land {},
        };
        let anon = CacheKey::valuation(&land, 41.0, 29.0, 5.0);
        assert!(anon.contains(":any:"));

        assert_eq!(
            CacheKey::valuation_pattern(PropertyType::Residential),
            "valuation:residential:*"
        );
    }

    #[test]
    fn test_cache_key_separates_radius_and_details() {
        let base = CacheKey::valuation(&flat(Some(3)), 41.00824, 28.97836, 5.0);

        // Broadened retry of the same request must not hit the narrow entry.
        let wider = CacheKey::valuation(&flat(Some(3)), 41.00824, 28.97836, 10.0);
        assert_ne!(base, wider);

        // Residential details change the estimate, so they change the key.
        let other_rooms = CacheKey::valuation(&flat(Some(4)), 41.00824, 28.97836, 5.0);
        assert_ne!(base, other_rooms);

        // Identical requests still share an entry.
        let repeat = CacheKey::valuation(&flat(Some(3)), 41.00824, 28.97836, 5.0);
        assert_eq!(base, repeat);
    }
}
