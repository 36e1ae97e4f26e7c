//! `PostgreSQL` implementation of the append-only status event log.
//!
//! One row per status event, keyed by `(sykmelding_id, timestamp)`. Inserts
//! use `ON CONFLICT DO NOTHING`, so a replayed append is a no-op rather than
//! an error; the affected-row count tells the two apart. Structured payloads
//! (employer reference, answer list) are stored as JSONB.
//!
//! # Example
//!
//! ```no_run
//! use sykmelding_status_postgres::PostgresStatusStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStatusStore::connect(
//!     "postgres://localhost/sykmeldinger",
//!     10,
//! ).await?;
//! store.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod records;

pub use records::{PostgresArbeidsgiverLookup, PostgresSykmeldingRecords};

use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use sykmelding_status_core::{
    AppendOutcome, ArbeidsgiverStatus, EventSource, Sporsmal, StatusEventStore, StatusEventTag,
    StatusStoreError, SykmeldingId, SykmeldingStatusEvent,
};

/// PostgreSQL-backed status event log.
#[derive(Clone)]
pub struct PostgresStatusStore {
    pool: Arc<PgPool>,
}

impl PostgresStatusStore {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError::Database`] if the pool cannot be created.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StatusStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StatusStoreError::Database(e.to_string()))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the event table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError::Database`] if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), StatusStoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sykmeldingstatus (
                 sykmelding_id TEXT NOT NULL,
                 timestamp TIMESTAMPTZ NOT NULL,
                 event TEXT NOT NULL,
                 arbeidsgiver JSONB,
                 sporsmal JSONB,
                 source TEXT NOT NULL,
                 PRIMARY KEY (sykmelding_id, timestamp)
             )",
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
        Ok(())
    }

    async fn append_inner(
        &self,
        event: SykmeldingStatusEvent,
    ) -> Result<AppendOutcome, StatusStoreError> {
        let arbeidsgiver = event
            .arbeidsgiver
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StatusStoreError::Serialization(e.to_string()))?;
        let sporsmal = event
            .sporsmal
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StatusStoreError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO sykmeldingstatus
                 (sykmelding_id, timestamp, event, arbeidsgiver, sporsmal, source)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (sykmelding_id, timestamp) DO NOTHING",
        )
        .bind(event.sykmelding_id.as_str())
        .bind(event.timestamp)
        .bind(event.status_event.as_str())
        .bind(arbeidsgiver)
        .bind(sporsmal)
        .bind(source_name(event.source))
        .execute(&*self.pool)
        .await
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                sykmelding_id = %event.sykmelding_id,
                timestamp = %event.timestamp,
                "Duplicate status event ignored"
            );
            Ok(AppendOutcome::Duplicate)
        } else {
            tracing::debug!(
                sykmelding_id = %event.sykmelding_id,
                status = %event.status_event,
                "Status event appended"
            );
            Ok(AppendOutcome::Appended)
        }
    }

    async fn latest_inner(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Result<Option<SykmeldingStatusEvent>, StatusStoreError> {
        let row = sqlx::query(
            "SELECT sykmelding_id, timestamp, event, arbeidsgiver, sporsmal, source
             FROM sykmeldingstatus
             WHERE sykmelding_id = $1
             ORDER BY timestamp DESC
             LIMIT 1",
        )
        .bind(sykmelding_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;

        row.map(row_to_event).transpose()
    }

    async fn history_inner(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Result<Vec<SykmeldingStatusEvent>, StatusStoreError> {
        let rows = sqlx::query(
            "SELECT sykmelding_id, timestamp, event, arbeidsgiver, sporsmal, source
             FROM sykmeldingstatus
             WHERE sykmelding_id = $1
             ORDER BY timestamp ASC",
        )
        .bind(sykmelding_id.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_event).collect()
    }
}

const fn source_name(source: EventSource) -> &'static str {
    match source {
        EventSource::User => "user",
        EventSource::System => "system",
    }
}

fn parse_source(s: &str) -> Result<EventSource, StatusStoreError> {
    match s {
        "user" => Ok(EventSource::User),
        "system" => Ok(EventSource::System),
        other => Err(StatusStoreError::Serialization(format!(
            "unknown event source: {other}"
        ))),
    }
}

fn row_to_event(row: PgRow) -> Result<SykmeldingStatusEvent, StatusStoreError> {
    let tag: String = row
        .try_get("event")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
    let status_event = StatusEventTag::parse(&tag)
        .ok_or_else(|| StatusStoreError::Serialization(format!("unknown status tag: {tag}")))?;

    let arbeidsgiver: Option<serde_json::Value> = row
        .try_get("arbeidsgiver")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
    let arbeidsgiver: Option<ArbeidsgiverStatus> = arbeidsgiver
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StatusStoreError::Serialization(e.to_string()))?;

    let sporsmal: Option<serde_json::Value> = row
        .try_get("sporsmal")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
    let sporsmal: Option<Vec<Sporsmal>> = sporsmal
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StatusStoreError::Serialization(e.to_string()))?;

    let sykmelding_id: String = row
        .try_get("sykmelding_id")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
    let timestamp = row
        .try_get("timestamp")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;
    let source: String = row
        .try_get("source")
        .map_err(|e| StatusStoreError::Database(e.to_string()))?;

    Ok(SykmeldingStatusEvent {
        sykmelding_id: SykmeldingId::new(sykmelding_id),
        timestamp,
        status_event,
        arbeidsgiver,
        sporsmal,
        source: parse_source(&source)?,
    })
}

impl StatusEventStore for PostgresStatusStore {
    fn append(
        &self,
        event: SykmeldingStatusEvent,
    ) -> Pin<Box<dyn Future<Output = Result<AppendOutcome, StatusStoreError>> + Send + '_>> {
        Box::pin(self.append_inner(event))
    }

    fn latest(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>
    {
        Box::pin(self.latest_inner(sykmelding_id))
    }

    fn history(
        &self,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SykmeldingStatusEvent>, StatusStoreError>> + Send + '_>>
    {
        Box::pin(self.history_inner(sykmelding_id))
    }
}
