//! # Check-In Record Repository
//!
//! Stay records and the counters the night audit rolls up.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::checkin::{CheckInRecord, CheckInStatus};

use crate::error::{DbError, DbResult};

/// Repository for check-in records.
#[derive(Debug, Clone)]
pub struct CheckInRepository {
    pool: SqlitePool,
}

impl CheckInRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CheckInRepository { pool }
    }

    /// Inserts a check-in record inside the caller's transaction. The
    /// UNIQUE index on `reservation_id` enforces at most one record per
    /// reservation.
    pub async fn insert_in(conn: &mut SqliteConnection, record: &CheckInRecord) -> DbResult<()> {
        debug!(id = %record.id, reservation_id = %record.reservation_id, "inserting check-in record");

        sqlx::query(
            "INSERT INTO checkin_records (
                id, reservation_id, property_id, room_id, number_of_guests,
                special_requests, deposit_cents, status, checked_in_at,
                checked_in_by, checked_out_at, checked_out_by,
                deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.reservation_id)
        .bind(&record.property_id)
        .bind(&record.room_id)
        .bind(record.number_of_guests)
        .bind(&record.special_requests)
        .bind(record.deposit_cents)
        .bind(record.status)
        .bind(record.checked_in_at)
        .bind(&record.checked_in_by)
        .bind(record.checked_out_at)
        .bind(&record.checked_out_by)
        .bind(record.deleted_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a record by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CheckInRecord>> {
        let record = sqlx::query_as::<_, CheckInRecord>(
            "SELECT * FROM checkin_records WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<CheckInRecord>> {
        let record = sqlx::query_as::<_, CheckInRecord>(
            "SELECT * FROM checkin_records WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// The record for a reservation, if one exists.
    pub async fn get_by_reservation(&self, reservation_id: &str) -> DbResult<Option<CheckInRecord>> {
        let record = sqlx::query_as::<_, CheckInRecord>(
            "SELECT * FROM checkin_records WHERE reservation_id = ? AND deleted_at IS NULL",
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// In-house records (status CheckedIn) for a property.
    pub async fn list_in_house(&self, property_id: &str) -> DbResult<Vec<CheckInRecord>> {
        let records = sqlx::query_as::<_, CheckInRecord>(
            "SELECT * FROM checkin_records
             WHERE property_id = ? AND status = 'checked_in' AND deleted_at IS NULL
             ORDER BY checked_in_at",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Guarded checkout write: only a CheckedIn record can depart.
    pub async fn mark_checked_out_in(
        conn: &mut SqliteConnection,
        id: &str,
        status: CheckInStatus,
        checked_out_at: DateTime<Utc>,
        checked_out_by: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE checkin_records
             SET status = ?, checked_out_at = ?, checked_out_by = ?, updated_at = ?
             WHERE id = ? AND status = 'checked_in' AND deleted_at IS NULL",
        )
        .bind(status)
        .bind(checked_out_at)
        .bind(checked_out_by)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CheckInRecord (checked-in)", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Night-audit counters
    // -------------------------------------------------------------------------

    /// Records still in house (occupied rooms at end of day).
    pub async fn count_in_house_in(
        conn: &mut SqliteConnection,
        property_id: &str,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkin_records
             WHERE property_id = ? AND status = 'checked_in' AND deleted_at IS NULL",
        )
        .bind(property_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Check-ins performed on a business date.
    pub async fn count_arrivals_on_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkin_records
             WHERE property_id = ? AND substr(checked_in_at, 1, 10) = ?
               AND deleted_at IS NULL",
        )
        .bind(property_id)
        .bind(business_date.format("%Y-%m-%d").to_string())
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Check-outs (including early departures) performed on a business
    /// date.
    pub async fn count_departures_on_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkin_records
             WHERE property_id = ?
               AND status IN ('checked_out', 'early_departure')
               AND checked_out_at IS NOT NULL
               AND substr(checked_out_at, 1, 10) = ?
               AND deleted_at IS NULL",
        )
        .bind(property_id)
        .bind(business_date.format("%Y-%m-%d").to_string())
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }
}
