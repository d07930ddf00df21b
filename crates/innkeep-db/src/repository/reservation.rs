//! # Reservation Repository
//!
//! Reservation rows, the status-guarded updates driving the booking DAG,
//! and the queries the night audit consumes.
//!
//! Status updates are guarded (`WHERE status = ?`) so a lost race shows up
//! as `rows_affected() == 0` instead of silently rewriting history.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::reservation::{Reservation, ReservationStatus};

use crate::error::{DbError, DbResult};

/// Repository for reservation records.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Inserts a reservation inside the caller's transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, reservation: &Reservation) -> DbResult<()> {
        debug!(id = %reservation.id, status = %reservation.status, "inserting reservation");

        sqlx::query(
            "INSERT INTO reservations (
                id, property_id, guest_id, room_type_id, room_id,
                check_in_date, check_out_date, adults, children,
                nightly_rate_cents, total_nights, status, source, notes,
                deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&reservation.id)
        .bind(&reservation.property_id)
        .bind(&reservation.guest_id)
        .bind(&reservation.room_type_id)
        .bind(&reservation.room_id)
        .bind(reservation.check_in_date)
        .bind(reservation.check_out_date)
        .bind(reservation.adults)
        .bind(reservation.children)
        .bind(reservation.nightly_rate_cents)
        .bind(reservation.total_nights)
        .bind(reservation.status)
        .bind(reservation.source)
        .bind(&reservation.notes)
        .bind(reservation.deleted_at)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a reservation by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(reservation)
    }

    /// Explicit escape hatch: includes soft-deleted rows.
    pub async fn get_with_deleted(&self, id: &str) -> DbResult<Option<Reservation>> {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(reservation)
    }

    /// Reservations for a property, optionally filtered by status, newest
    /// arrival first.
    pub async fn list_by_property(
        &self,
        property_id: &str,
        status: Option<ReservationStatus>,
    ) -> DbResult<Vec<Reservation>> {
        let mut sql = String::from(
            "SELECT * FROM reservations WHERE property_id = ? AND deleted_at IS NULL",
        );
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY check_in_date DESC, created_at DESC");

        let mut query = sqlx::query_as::<_, Reservation>(&sql).bind(property_id);
        if let Some(status) = status {
            query = query.bind(status);
        }

        let reservations = query.fetch_all(&self.pool).await?;
        Ok(reservations)
    }

    /// Status-guarded transition inside the caller's transaction.
    /// `rows_affected() == 0` means the row vanished or the status moved
    /// under us; surfaced as NotFound for the caller to map.
    pub async fn update_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE reservations SET status = ?, updated_at = ?
             WHERE id = ? AND status = ? AND deleted_at IS NULL",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", id));
        }

        Ok(())
    }

    /// Records the physical room chosen at check-in.
    pub async fn assign_room_in(
        conn: &mut SqliteConnection,
        id: &str,
        room_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE reservations SET room_id = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(room_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", id));
        }

        Ok(())
    }

    /// Whether a room-blocking reservation overlaps `[check_in,
    /// check_out)` on the given room, excluding `exclude_id` (the
    /// reservation being checked in).
    pub async fn overlap_exists_in(
        conn: &mut SqliteConnection,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations
             WHERE room_id = ?
               AND id <> ?
               AND deleted_at IS NULL
               AND status IN ('confirmed', 'checked_in')
               AND check_in_date < ?
               AND ? < check_out_date",
        )
        .bind(room_id)
        .bind(exclude_id)
        .bind(check_out)
        .bind(check_in)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    /// Night audit step 3: Confirmed reservations whose arrival date has
    /// passed become NoShow. Returns how many were marked.
    pub async fn mark_no_shows_before_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE reservations SET status = 'no_show', updated_at = ?
             WHERE property_id = ?
               AND status = 'confirmed'
               AND check_in_date < ?
               AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(property_id)
        .bind(business_date)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// No-show count for one arrival date (audit counter).
    pub async fn count_no_shows_on_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations
             WHERE property_id = ? AND check_in_date = ? AND status = 'no_show'
               AND deleted_at IS NULL",
        )
        .bind(property_id)
        .bind(business_date)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Logical delete (tombstone). Reservations are never hard-deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE reservations SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", id));
        }

        Ok(())
    }
}
