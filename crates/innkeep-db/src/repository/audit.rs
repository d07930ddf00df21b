//! # Night Audit Repository
//!
//! Audit records. The UNIQUE (property_id, business_date) index makes the
//! audit naturally single-writer; a completed record's counters are never
//! updated.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::audit::NightAuditRecord;

use crate::error::DbResult;

/// Repository for night-audit records.
#[derive(Debug, Clone)]
pub struct NightAuditRepository {
    pool: SqlitePool,
}

impl NightAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NightAuditRepository { pool }
    }

    /// The record for one (property, date), if any.
    pub async fn find(
        &self,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<Option<NightAuditRecord>> {
        let record = sqlx::query_as::<_, NightAuditRecord>(
            "SELECT * FROM night_audits WHERE property_id = ? AND business_date = ?",
        )
        .bind(property_id)
        .bind(business_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Transaction-scoped variant of [`Self::find`].
    pub async fn find_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<Option<NightAuditRecord>> {
        let record = sqlx::query_as::<_, NightAuditRecord>(
            "SELECT * FROM night_audits WHERE property_id = ? AND business_date = ?",
        )
        .bind(property_id)
        .bind(business_date)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Inserts a completed audit record. The UNIQUE index turns a
    /// concurrent duplicate into a UniqueViolation the service absorbs.
    pub async fn insert_in(conn: &mut SqliteConnection, record: &NightAuditRecord) -> DbResult<()> {
        debug!(
            property_id = %record.property_id,
            business_date = %record.business_date,
            "inserting night-audit record"
        );

        sqlx::query(
            "INSERT INTO night_audits (
                id, property_id, business_date, performed_by, occupied_rooms,
                revenue_cents, arrivals, departures, no_shows, is_completed,
                started_at, completed_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.property_id)
        .bind(record.business_date)
        .bind(&record.performed_by)
        .bind(record.occupied_rooms)
        .bind(record.revenue_cents)
        .bind(record.arrivals)
        .bind(record.departures)
        .bind(record.no_shows)
        .bind(record.is_completed)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Audit history for a property, most recent first.
    pub async fn list_for_property(&self, property_id: &str) -> DbResult<Vec<NightAuditRecord>> {
        let records = sqlx::query_as::<_, NightAuditRecord>(
            "SELECT * FROM night_audits WHERE property_id = ? ORDER BY business_date DESC",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
