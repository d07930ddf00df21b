//! # Room Repository
//!
//! Room rows and the availability scan.
//!
//! ## Availability
//! A room is available for `[check_in, check_out)` iff its status is
//! bookable right now and no reservation with a room-blocking status
//! (Confirmed, CheckedIn) overlaps the half-open range. The scan runs
//! inside the check-in transaction, under the per-property lock.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::money::Money;
use innkeep_core::room::{Room, RoomStatus};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// Repository for room records.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    pub async fn create(
        &self,
        property_id: &str,
        room_number: &str,
        room_type_id: &str,
        base_price: Money,
        floor_id: Option<&str>,
    ) -> DbResult<Room> {
        let now = Utc::now();
        let room = Room {
            id: new_id(),
            property_id: property_id.to_string(),
            floor_id: floor_id.map(str::to_string),
            room_number: room_number.trim().to_string(),
            room_type_id: room_type_id.to_string(),
            status: RoomStatus::Available,
            base_price_cents: base_price.cents(),
            notes: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %room.id, room_number = %room.room_number, "creating room");

        sqlx::query(
            "INSERT INTO rooms (
                id, property_id, floor_id, room_number, room_type_id, status,
                base_price_cents, notes, deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&room.id)
        .bind(&room.property_id)
        .bind(&room.floor_id)
        .bind(&room.room_number)
        .bind(&room.room_type_id)
        .bind(room.status)
        .bind(room.base_price_cents)
        .bind(&room.notes)
        .bind(room.deleted_at)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(room)
    }

    /// Gets a room by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        let room =
            sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(room)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Room>> {
        let room =
            sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(room)
    }

    /// Rooms of a property ordered by floor level then room number,
    /// optionally filtered by floor and status.
    pub async fn list_by_floor(
        &self,
        property_id: &str,
        floor_id: Option<&str>,
        status: Option<RoomStatus>,
    ) -> DbResult<Vec<Room>> {
        let mut sql = String::from(
            "SELECT r.* FROM rooms r
             LEFT JOIN floors fl ON fl.id = r.floor_id
             WHERE r.property_id = ? AND r.deleted_at IS NULL",
        );
        if floor_id.is_some() {
            sql.push_str(" AND r.floor_id = ?");
        }
        if status.is_some() {
            sql.push_str(" AND r.status = ?");
        }
        sql.push_str(" ORDER BY COALESCE(fl.level, 0), r.room_number");

        let mut query = sqlx::query_as::<_, Room>(&sql).bind(property_id);
        if let Some(floor_id) = floor_id {
            query = query.bind(floor_id);
        }
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rooms = query.fetch_all(&self.pool).await?;
        Ok(rooms)
    }

    /// Availability scan for `[check_in, check_out)`, ordered by room
    /// number ascending (auto-assignment takes the first).
    ///
    /// Must run inside the check-in transaction under the per-property
    /// lock; the scan and the assignment must not be separated.
    pub async fn find_available_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        room_type_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT r.* FROM rooms r
            WHERE r.property_id = ?
              AND r.room_type_id = ?
              AND r.status = 'available'
              AND r.deleted_at IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM reservations b
                  WHERE b.room_id = r.id
                    AND b.deleted_at IS NULL
                    AND b.status IN ('confirmed', 'checked_in')
                    AND b.check_in_date < ?
                    AND ? < b.check_out_date
              )
            ORDER BY r.room_number
            "#,
        )
        .bind(property_id)
        .bind(room_type_id)
        .bind(check_out)
        .bind(check_in)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rooms)
    }

    /// Unconditional status write inside the caller's transaction. The
    /// caller has already validated the transition (housekeeping machine
    /// or check-in/out ownership of Occupied).
    pub async fn set_status_in(
        conn: &mut SqliteConnection,
        room_id: &str,
        status: RoomStatus,
    ) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE rooms SET status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(status)
                .bind(Utc::now())
                .bind(room_id)
                .execute(&mut *conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", room_id));
        }

        Ok(())
    }

    /// Logical delete. Fails on rooms that are currently occupied.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE rooms SET deleted_at = ?
             WHERE id = ? AND deleted_at IS NULL AND status <> 'occupied'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", id));
        }

        Ok(())
    }
}
