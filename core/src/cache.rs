//! The latest-status cache.
//!
//! The cache is an optimization, never a correctness requirement: it lets
//! reads skip the multi-table join against the durable store. Writes are
//! best-effort; a failed `put` is logged by the implementation and never
//! propagated, so cache trouble cannot fail the surrounding write path.
//!
//! The cache tolerates being stale within its TTL, and it may also be
//! *ahead* of the durable read path right after a write. Readers must
//! therefore always compare timestamps against the durable store instead of
//! trusting a hit blindly; that comparison lives in the read-model assembler.

use crate::event::{SykmeldingId, SykmeldingStatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A cached status event together with its expiry instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedStatus {
    /// The most recently written event for the id.
    pub event: SykmeldingStatusEvent,
    /// When the entry stops being served, even if the backend has not
    /// evicted it yet.
    pub expires_at: DateTime<Utc>,
}

impl CachedStatus {
    /// Whether the entry is still servable at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Abstraction over the latest-status cache.
///
/// # Implementations
///
/// - `RedisStatusCache` (`sykmelding-status-cache`): production
/// - `InMemoryStatusCache` (`sykmelding-status-testing`): tests
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns for `Arc<dyn StatusCache>`
/// injection.
pub trait StatusCache: Send + Sync {
    /// Write the latest event for its id, best-effort. Implementations log
    /// failures and return normally; callers never see cache errors.
    fn put(
        &self,
        event: SykmeldingStatusEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Read the cached status, or `None` on miss, expiry, or any backend
    /// trouble (logged by the implementation).
    fn get(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Option<CachedStatus>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventSource, StatusEventTag};
    use chrono::Duration;

    #[test]
    fn freshness_is_strict_on_expiry() {
        let now = Utc::now();
        let cached = CachedStatus {
            event: SykmeldingStatusEvent {
                sykmelding_id: SykmeldingId::new("syk-1"),
                timestamp: now,
                status_event: StatusEventTag::Sent,
                arbeidsgiver: None,
                sporsmal: None,
                source: EventSource::User,
            },
            expires_at: now + Duration::seconds(60),
        };

        assert!(cached.is_fresh(now));
        assert!(!cached.is_fresh(now + Duration::seconds(60)));
        assert!(!cached.is_fresh(now + Duration::seconds(61)));
    }
}
