//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, FILL_GUARD};
use crate::domain::entities::ResolvedLink;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, Value, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Stored in place of an invalidated entry until [`FILL_GUARD`] expires.
const TOMBSTONE: &str = "";

/// Redis cache for redirect lookups.
///
/// Entries are JSON-encoded [`ResolvedLink`] values stored under `link:<slug>`.
/// Fills use `SET NX`, so they never overwrite an entry or a tombstone.
/// Uses `ConnectionManager` for connection reuse and reconnects.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// `default_ttl_seconds` comes from `CACHE_TTL_SECONDS`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        })
    }

    fn build_key(&self, slug: &str) -> String {
        format!("{}{}", self.key_prefix, slug)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ResolvedLink>> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        let raw = conn
            .get::<_, Option<String>>(&key)
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {key}: {e}")))?;

        let Some(raw) = raw.filter(|raw| raw != TOMBSTONE) else {
            debug!(slug, "Cache MISS");
            return Ok(None);
        };

        match serde_json::from_str::<ResolvedLink>(&raw) {
            Ok(link) => {
                debug!(slug, "Cache HIT");
                Ok(Some(link))
            }
            Err(e) => {
                warn!(slug, error = %e, "Discarding undecodable cache entry");
                let _ = conn.del::<_, i32>(&key).await;
                Ok(None)
            }
        }
    }

    async fn fill_link(&self, link: &ResolvedLink, ttl_seconds: Option<u64>) -> CacheResult<bool> {
        let key = self.build_key(&link.slug);
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        let value = serde_json::to_string(link)
            .map_err(|e| CacheError::OperationError(format!("encode {key}: {e}")))?;

        // NX: an existing entry or tombstone wins.
        let reply: Value = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::OperationError(format!("SET NX {key}: {e}")))?;

        let stored = !matches!(reply, Value::Nil);
        debug!(slug = %link.slug, ttl, stored, "Cache FILL");
        Ok(stored)
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, TOMBSTONE, FILL_GUARD.as_secs())
            .await
            .map_err(|e| CacheError::OperationError(format!("SET {key} tombstone: {e}")))?;

        debug!(slug, "Cache INVALIDATE");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
