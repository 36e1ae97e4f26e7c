//! Integration tests for [`RedisStatusCache`].
//!
//! Requires a running Redis instance:
//!
//! ```bash
//! docker run -d --name status-redis -p 6379:6379 redis:7-alpine
//! cargo test -p sykmelding-status-cache -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use std::time::Duration;
use sykmelding_status_cache::RedisStatusCache;
use sykmelding_status_core::{
    EventSource, StatusCache, StatusEventTag, SykmeldingId, SykmeldingStatusEvent,
};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn event(id: &SykmeldingId, tag: StatusEventTag) -> SykmeldingStatusEvent {
    SykmeldingStatusEvent {
        sykmelding_id: id.clone(),
        timestamp: Utc::now(),
        status_event: tag,
        arbeidsgiver: None,
        sporsmal: None,
        source: EventSource::User,
    }
}

#[tokio::test]
#[ignore]
async fn put_then_get_returns_event() {
    let cache = RedisStatusCache::new(&redis_url(), Duration::from_secs(60))
        .await
        .unwrap();
    let id = SykmeldingId::new(uuid::Uuid::new_v4().to_string());

    cache.put(event(&id, StatusEventTag::Confirmed)).await;

    let cached = cache.get(id).await.unwrap();
    assert_eq!(cached.event.status_event, StatusEventTag::Confirmed);
    assert!(cached.is_fresh(Utc::now()));
}

#[tokio::test]
#[ignore]
async fn miss_on_unknown_id() {
    let cache = RedisStatusCache::new(&redis_url(), Duration::from_secs(60))
        .await
        .unwrap();
    let id = SykmeldingId::new(uuid::Uuid::new_v4().to_string());

    assert!(cache.get(id).await.is_none());
}

#[tokio::test]
#[ignore]
async fn later_put_overwrites_earlier() {
    let cache = RedisStatusCache::new(&redis_url(), Duration::from_secs(60))
        .await
        .unwrap();
    let id = SykmeldingId::new(uuid::Uuid::new_v4().to_string());

    cache.put(event(&id, StatusEventTag::Sent)).await;
    cache.put(event(&id, StatusEventTag::Aborted)).await;

    let cached = cache.get(id).await.unwrap();
    assert_eq!(cached.event.status_event, StatusEventTag::Aborted);
}

#[tokio::test]
#[ignore]
async fn expired_entry_is_a_miss() {
    let cache = RedisStatusCache::new(&redis_url(), Duration::from_secs(1))
        .await
        .unwrap();
    let id = SykmeldingId::new(uuid::Uuid::new_v4().to_string());

    cache.put(event(&id, StatusEventTag::Sent)).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(cache.get(id).await.is_none());
}

#[tokio::test]
#[ignore]
async fn prefixes_keep_tenants_apart() {
    let id = SykmeldingId::new(uuid::Uuid::new_v4().to_string());

    let a = RedisStatusCache::with_prefix(&redis_url(), Duration::from_secs(60), "a:")
        .await
        .unwrap();
    let b = RedisStatusCache::with_prefix(&redis_url(), Duration::from_secs(60), "b:")
        .await
        .unwrap();

    a.put(event(&id, StatusEventTag::Sent)).await;

    assert!(a.get(id.clone()).await.is_some());
    assert!(b.get(id).await.is_none());
}
