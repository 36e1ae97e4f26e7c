//! Read-only views of tables owned by the primary sykmelding service.
//!
//! The status service never writes these tables and never creates them; it
//! only answers two questions from them: does this sykmelding belong to this
//! subject, and what does the subject's employment at an orgnummer look like.
//!
//! Expected shapes:
//!
//! ```sql
//! sykmelding     (sykmelding_id TEXT PRIMARY KEY, fnr TEXT NOT NULL, ...)
//! arbeidsforhold (fnr TEXT, orgnummer TEXT, juridisk_orgnummer TEXT,
//!                 org_navn TEXT, tom DATE, ...)
//! ```

use sqlx::Row;
use sqlx::postgres::PgPool;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use sykmelding_status_core::{
    ArbeidsgiverLookup, ArbeidsgiverStatus, ExternalError, SykmeldingId, SykmeldingRecords,
    TidligereArbeidsgiver,
};

/// Ownership lookups against the primary sykmelding table.
#[derive(Clone)]
pub struct PostgresSykmeldingRecords {
    pool: Arc<PgPool>,
}

impl PostgresSykmeldingRecords {
    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl SykmeldingRecords for PostgresSykmeldingRecords {
    fn owned_by(
        &self,
        sykmelding_id: SykmeldingId,
        fnr: String,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ExternalError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT EXISTS (
                     SELECT 1 FROM sykmelding
                     WHERE sykmelding_id = $1 AND fnr = $2
                 ) AS owned",
            )
            .bind(sykmelding_id.as_str())
            .bind(&fnr)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?;

            row.try_get("owned")
                .map_err(|e| ExternalError::Unavailable(e.to_string()))
        })
    }
}

/// Employment lookups against the replicated arbeidsforhold table.
#[derive(Clone)]
pub struct PostgresArbeidsgiverLookup {
    pool: Arc<PgPool>,
}

impl PostgresArbeidsgiverLookup {
    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn employer_from_row(row: &sqlx::postgres::PgRow) -> Result<ArbeidsgiverStatus, ExternalError> {
    Ok(ArbeidsgiverStatus {
        orgnummer: row
            .try_get("orgnummer")
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?,
        juridisk_orgnummer: row
            .try_get("juridisk_orgnummer")
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?,
        org_navn: row
            .try_get("org_navn")
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?,
    })
}

impl ArbeidsgiverLookup for PostgresArbeidsgiverLookup {
    fn arbeidsgiver(
        &self,
        fnr: String,
        orgnummer: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ArbeidsgiverStatus>, ExternalError>> + Send + '_>>
    {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT orgnummer, juridisk_orgnummer, org_navn
                 FROM arbeidsforhold
                 WHERE fnr = $1 AND orgnummer = $2
                 LIMIT 1",
            )
            .bind(&fnr)
            .bind(&orgnummer)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?;

            row.as_ref().map(employer_from_row).transpose()
        })
    }

    fn tidligere_arbeidsgiver(
        &self,
        fnr: String,
        _sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TidligereArbeidsgiver>, ExternalError>> + Send + '_>>
    {
        Box::pin(async move {
            // Most recently ended employment; open-ended rows sort first.
            let row = sqlx::query(
                "SELECT orgnummer, org_navn
                 FROM arbeidsforhold
                 WHERE fnr = $1
                 ORDER BY tom DESC NULLS FIRST
                 LIMIT 1",
            )
            .bind(&fnr)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| ExternalError::Unavailable(e.to_string()))?;

            row.map(|row| {
                Ok(TidligereArbeidsgiver {
                    org_navn: row
                        .try_get("org_navn")
                        .map_err(|e| ExternalError::Unavailable(e.to_string()))?,
                    orgnummer: row
                        .try_get("orgnummer")
                        .map_err(|e| ExternalError::Unavailable(e.to_string()))?,
                })
            })
            .transpose()
        })
    }
}
