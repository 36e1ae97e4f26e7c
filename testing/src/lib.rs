//! # Sykmelding Status Testing
//!
//! Deterministic in-memory implementations of the status lifecycle's
//! adapter traits and external-collaborator interfaces:
//!
//! - [`InMemoryStatusStore`]: append-only log in a `HashMap`, idempotent on
//!   `(sykmelding_id, timestamp)` like the real store
//! - [`RecordingStatusPublisher`]: captures published envelopes; can be told
//!   to fail to exercise the fatal-publish path
//! - [`InMemoryStatusCache`]: TTL honoured through an injected clock; can be
//!   told to drop writes to exercise the best-effort path
//! - [`FixedClock`]: manually advanced time
//! - [`StaticSykmeldingRecords`] / [`StaticArbeidsgiverLookup`]: canned
//!   ownership and employer answers
//!
//! Everything here is synchronous under the hood; the boxed futures resolve
//! immediately, which keeps tests fast and order-deterministic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use sykmelding_status_core::{
    AppendOutcome, ArbeidsgiverLookup, ArbeidsgiverStatus, CachedStatus, Clock, ExternalError,
    StatusCache, StatusEventStore, StatusMessage, StatusPublisher, StatusStoreError, SykmeldingId,
    SykmeldingRecords, SykmeldingStatusEvent, TidligereArbeidsgiver,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock in a test fake carries no invariant worth protecting.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    time: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut time = lock(&self.time);
        *time += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.time)
    }
}

/// In-memory append-only status log.
#[derive(Default)]
pub struct InMemoryStatusStore {
    events: Mutex<HashMap<SykmeldingId, Vec<SykmeldingStatusEvent>>>,
    failing: AtomicBool,
}

impl InMemoryStatusStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored events for an id; used to assert row-count
    /// invariance under duplicate appends.
    #[must_use]
    pub fn event_count(&self, sykmelding_id: &SykmeldingId) -> usize {
        lock(&self.events)
            .get(sykmelding_id)
            .map_or(0, Vec::len)
    }

    fn check(&self) -> Result<(), StatusStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StatusStoreError::Database(
                "induced failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl StatusEventStore for InMemoryStatusStore {
    fn append(
        &self,
        event: SykmeldingStatusEvent,
    ) -> Pin<Box<dyn Future<Output = Result<AppendOutcome, StatusStoreError>> + Send + '_>> {
        Box::pin(async move {
            self.check()?;
            let mut events = lock(&self.events);
            let log = events.entry(event.sykmelding_id.clone()).or_default();
            if log.iter().any(|e| e.timestamp == event.timestamp) {
                return Ok(AppendOutcome::Duplicate);
            }
            log.push(event);
            Ok(AppendOutcome::Appended)
        })
    }

    fn latest(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            self.check()?;
            let events = lock(&self.events);
            Ok(events
                .get(&sykmelding_id)
                .and_then(|log| log.iter().max_by_key(|e| e.timestamp))
                .cloned())
        })
    }

    fn history(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            self.check()?;
            let events = lock(&self.events);
            let mut log = events.get(&sykmelding_id).cloned().unwrap_or_default();
            log.sort_by_key(|e| e.timestamp);
            Ok(log)
        })
    }
}

/// Publisher that records every envelope instead of sending it.
#[derive(Default)]
pub struct RecordingStatusPublisher {
    published: Mutex<Vec<StatusMessage>>,
    failing: AtomicBool,
}

impl RecordingStatusPublisher {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<StatusMessage> {
        lock(&self.published).clone()
    }
}

impl StatusPublisher for RecordingStatusPublisher {
    fn publish(
        &self,
        message: StatusMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), sykmelding_status_core::PublishError>> + Send + '_>>
    {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(sykmelding_status_core::PublishError::Delivery {
                    topic: "test".to_string(),
                    reason: "induced failure".to_string(),
                });
            }
            lock(&self.published).push(message);
            Ok(())
        })
    }
}

/// In-memory latest-status cache with clock-driven expiry.
pub struct InMemoryStatusCache {
    entries: Mutex<HashMap<SykmeldingId, CachedStatus>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    failing: AtomicBool,
}

impl InMemoryStatusCache {
    /// Cache with the given TTL, timed by `clock`.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent puts silently drop, mimicking an unreachable backend
    /// behind the best-effort contract.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StatusCache for InMemoryStatusCache {
    fn put(&self, event: SykmeldingStatusEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return;
            }
            let cached = CachedStatus {
                expires_at: self.clock.now() + self.ttl,
                event,
            };
            lock(&self.entries).insert(cached.event.sykmelding_id.clone(), cached);
        })
    }

    fn get(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Option<CachedStatus>> + Send + '_>> {
        Box::pin(async move {
            let now = self.clock.now();
            lock(&self.entries)
                .get(&sykmelding_id)
                .filter(|cached| cached.is_fresh(now))
                .cloned()
        })
    }
}

/// Canned ownership answers keyed by sykmelding id.
#[derive(Default)]
pub struct StaticSykmeldingRecords {
    owners: Mutex<HashMap<SykmeldingId, String>>,
}

impl StaticSykmeldingRecords {
    /// Empty record set; every lookup answers "not owned".
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fnr` as the owner of `sykmelding_id`.
    pub fn insert(&self, sykmelding_id: SykmeldingId, fnr: impl Into<String>) {
        lock(&self.owners).insert(sykmelding_id, fnr.into());
    }
}

impl SykmeldingRecords for StaticSykmeldingRecords {
    fn owned_by(
        &self,
        sykmelding_id: SykmeldingId,
        fnr: String,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ExternalError>> + Send + '_>> {
        Box::pin(async move {
            Ok(lock(&self.owners)
                .get(&sykmelding_id)
                .is_some_and(|owner| *owner == fnr))
        })
    }
}

/// Canned employer answers keyed by orgnummer.
#[derive(Default)]
pub struct StaticArbeidsgiverLookup {
    arbeidsgivere: Mutex<HashMap<String, ArbeidsgiverStatus>>,
    tidligere: Mutex<Option<TidligereArbeidsgiver>>,
}

impl StaticArbeidsgiverLookup {
    /// Empty lookup; every orgnummer resolves to `None`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an employer for its orgnummer.
    pub fn insert(&self, arbeidsgiver: ArbeidsgiverStatus) {
        lock(&self.arbeidsgivere).insert(arbeidsgiver.orgnummer.clone(), arbeidsgiver);
    }

    /// Set the previous-employer answer.
    pub fn set_tidligere(&self, tidligere: Option<TidligereArbeidsgiver>) {
        *lock(&self.tidligere) = tidligere;
    }
}

impl ArbeidsgiverLookup for StaticArbeidsgiverLookup {
    fn arbeidsgiver(
        &self,
        _fnr: String,
        orgnummer: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ArbeidsgiverStatus>, ExternalError>> + Send + '_>>
    {
        Box::pin(async move { Ok(lock(&self.arbeidsgivere).get(&orgnummer).cloned()) })
    }

    fn tidligere_arbeidsgiver(
        &self,
        _fnr: String,
        _sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TidligereArbeidsgiver>, ExternalError>> + Send + '_>>
    {
        Box::pin(async move { Ok(lock(&self.tidligere).clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sykmelding_status_core::{EventSource, StatusEventTag};

    fn event(id: &str, timestamp: DateTime<Utc>, tag: StatusEventTag) -> SykmeldingStatusEvent {
        SykmeldingStatusEvent {
            sykmelding_id: SykmeldingId::new(id),
            timestamp,
            status_event: tag,
            arbeidsgiver: None,
            sporsmal: None,
            source: EventSource::User,
        }
    }

    #[tokio::test]
    async fn store_append_is_idempotent_on_id_and_timestamp() {
        let store = InMemoryStatusStore::new();
        let now = Utc::now();
        let e = event("syk-1", now, StatusEventTag::Sent);

        let first = store.append(e.clone()).await;
        let second = store.append(e).await;

        assert!(matches!(first, Ok(AppendOutcome::Appended)));
        assert!(matches!(second, Ok(AppendOutcome::Duplicate)));
        assert_eq!(store.event_count(&SykmeldingId::new("syk-1")), 1);
    }

    #[tokio::test]
    async fn store_latest_picks_max_timestamp() {
        let store = InMemoryStatusStore::new();
        let now = Utc::now();
        let _ = store.append(event("syk-1", now, StatusEventTag::Sent)).await;
        let _ = store
            .append(event(
                "syk-1",
                now + Duration::seconds(5),
                StatusEventTag::Aborted,
            ))
            .await;

        let latest = store.latest(SykmeldingId::new("syk-1")).await;
        assert!(
            matches!(latest, Ok(Some(e)) if e.status_event == StatusEventTag::Aborted)
        );
    }

    #[tokio::test]
    async fn cache_honours_ttl_through_the_clock() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let cache = InMemoryStatusCache::new(Duration::seconds(60), clock.clone());
        let e = event("syk-1", clock.now(), StatusEventTag::Sent);

        cache.put(e.clone()).await;
        let hit = cache.get(SykmeldingId::new("syk-1")).await;
        assert!(hit.is_some_and(|c| c.event == e));

        clock.advance(Duration::seconds(61));
        assert!(cache.get(SykmeldingId::new("syk-1")).await.is_none());
    }

    #[tokio::test]
    async fn failing_publisher_reports_delivery_error() {
        let publisher = RecordingStatusPublisher::new();
        publisher.set_failing(true);
        let message = StatusMessage::from_event(
            &event("syk-1", Utc::now(), StatusEventTag::Aborted),
            None,
            None,
        );
        assert!(publisher.publish(message).await.is_err());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn ownership_is_per_subject() {
        let records = StaticSykmeldingRecords::new();
        records.insert(SykmeldingId::new("syk-1"), "12345678901");

        let owned = records
            .owned_by(SykmeldingId::new("syk-1"), "12345678901".to_string())
            .await;
        let foreign = records
            .owned_by(SykmeldingId::new("syk-1"), "10987654321".to_string())
            .await;

        assert!(matches!(owned, Ok(true)));
        assert!(matches!(foreign, Ok(false)));
    }
}
