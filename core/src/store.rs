//! The durable, append-only status event log.
//!
//! The log is the source of truth for status history. Events are keyed by
//! `(sykmelding_id, timestamp)`; appending an event with a key that already
//! exists is a no-op, not an error, so replays are harmless.
//!
//! There is no compare-and-swap across concurrent submissions for the same
//! id: two racing writes may land with out-of-order-looking wall-clock
//! timestamps. That is an accepted limitation of the design, not a guarantee
//! the store provides.

use crate::event::{SykmeldingId, SykmeldingStatusEvent};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from the durable event log.
///
/// Any of these is fatal to the surrounding status-registration operation;
/// the log is never best-effort.
#[derive(Debug, Error)]
pub enum StatusStoreError {
    /// Database connection or query failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored event could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result of an append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new row was written.
    Appended,
    /// The `(sykmelding_id, timestamp)` key already existed; nothing changed.
    Duplicate,
}

/// Abstraction over the append-only status event log.
///
/// # Implementations
///
/// - `PostgresStatusStore` (`sykmelding-status-postgres`): production
/// - `InMemoryStatusStore` (`sykmelding-status-testing`): deterministic tests
///
/// # Dyn Compatibility
///
/// Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// the trait can be used as `Arc<dyn StatusEventStore>` and injected into the
/// status service at construction time.
pub trait StatusEventStore: Send + Sync {
    /// Append one event; idempotent on `(sykmelding_id, timestamp)`.
    ///
    /// # Errors
    ///
    /// [`StatusStoreError`] when the backend rejects the write.
    fn append(
        &self,
        event: SykmeldingStatusEvent,
    ) -> Pin<Box<dyn Future<Output = Result<AppendOutcome, StatusStoreError>> + Send + '_>>;

    /// The event with the maximum timestamp for the id, if any.
    ///
    /// A missing log is `Ok(None)`, meaning the sykmelding is implicitly
    /// `OPEN`; it is not an error.
    ///
    /// # Errors
    ///
    /// [`StatusStoreError`] when the backend query fails.
    fn latest(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>;

    /// Full per-id history, ordered oldest first.
    ///
    /// # Errors
    ///
    /// [`StatusStoreError`] when the backend query fails.
    fn history(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>;
}
