//! Redis-backed latest-status cache.
//!
//! Stores one [`CachedStatus`] per sykmelding under `{prefix}{sykmeldingId}`,
//! bincode-serialized, with the TTL enforced both by Redis (`SET EX`) and by
//! an application-level `expires_at` check on read. The double check guards
//! against clock skew and backend eviction quirks.
//!
//! Writes are best-effort: a failed put is logged and swallowed, so cache
//! trouble never fails the surrounding status registration.
//!
//! # Example
//!
//! ```no_run
//! use sykmelding_status_cache::RedisStatusCache;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisStatusCache::new(
//!     "redis://127.0.0.1:6379",
//!     Duration::from_secs(60),
//! ).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use sykmelding_status_core::{CachedStatus, StatusCache, SykmeldingId, SykmeldingStatusEvent};

const DEFAULT_KEY_PREFIX: &str = "sykmeldingstatus:";

/// Errors from constructing the cache client.
///
/// Runtime get/put trouble is not surfaced as an error; it is logged and the
/// operation degrades to a miss or a dropped write.
#[derive(Debug)]
pub struct CacheConnectError(String);

impl std::fmt::Display for CacheConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to connect to redis: {}", self.0)
    }
}

impl std::error::Error for CacheConnectError {}

/// Redis-backed [`StatusCache`] with TTL-based expiration.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn_manager: ConnectionManager,
    ttl: Duration,
    prefix: String,
}

impl RedisStatusCache {
    /// Create a cache with the default key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConnectError`] if the client or connection manager
    /// cannot be created.
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self, CacheConnectError> {
        Self::with_prefix(redis_url, ttl, DEFAULT_KEY_PREFIX).await
    }

    /// Create a cache with a custom key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConnectError`] if the client or connection manager
    /// cannot be created.
    pub async fn with_prefix(
        redis_url: &str,
        ttl: Duration,
        prefix: impl Into<String>,
    ) -> Result<Self, CacheConnectError> {
        let client = Client::open(redis_url).map_err(|e| CacheConnectError(e.to_string()))?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheConnectError(e.to_string()))?;

        Ok(Self {
            conn_manager,
            ttl,
            prefix: prefix.into(),
        })
    }

    fn key(&self, sykmelding_id: &SykmeldingId) -> String {
        format!("{}{}", self.prefix, sykmelding_id.as_str())
    }

    async fn put_inner(&self, event: SykmeldingStatusEvent) {
        let key = self.key(&event.sykmelding_id);
        let ttl = match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => ttl,
            Err(e) => {
                tracing::warn!(error = %e, "Cache TTL out of range, dropping cache write");
                return;
            }
        };
        let cached = CachedStatus {
            expires_at: Utc::now() + ttl,
            event,
        };

        let bytes = match bincode::serialize(&cached) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize cached status");
                return;
            }
        };

        let mut conn = self.conn_manager.clone();
        let result: Result<(), redis::RedisError> =
            conn.set_ex(&key, bytes, self.ttl.as_secs()).await;
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Cache write failed, continuing without it");
        }
    }

    async fn get_inner(&self, sykmelding_id: SykmeldingId) -> Option<CachedStatus> {
        let key = self.key(&sykmelding_id);
        let mut conn = self.conn_manager.clone();

        let bytes: Option<Vec<u8>> = match conn.get(&key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let cached: CachedStatus = match bincode::deserialize(&bytes?) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt cache entry, treating as miss");
                return None;
            }
        };

        // Redis should have evicted the key already; this check covers skew.
        if cached.is_fresh(Utc::now()) {
            Some(cached)
        } else {
            None
        }
    }
}

impl StatusCache for RedisStatusCache {
    fn put(&self, event: SykmeldingStatusEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.put_inner(event))
    }

    fn get(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Option<CachedStatus>> + Send + '_>> {
        Box::pin(self.get_inner(sykmelding_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let id = SykmeldingId::new("syk-1");
        assert_eq!(
            format!("{DEFAULT_KEY_PREFIX}{}", id.as_str()),
            "sykmeldingstatus:syk-1"
        );
    }

    #[test]
    fn cache_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedisStatusCache>();
        assert_sync::<RedisStatusCache>();
    }
}
