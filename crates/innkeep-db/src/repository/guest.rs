//! # Guest Repository
//!
//! Guest identity rows. The walk-in flow upserts by email inside the
//! check-in transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::guest::Guest;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// Repository for guest records.
#[derive(Debug, Clone)]
pub struct GuestRepository {
    pool: SqlitePool,
}

impl GuestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GuestRepository { pool }
    }

    pub async fn create(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> DbResult<Guest> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_by_email_in(&mut conn, full_name, email, phone).await
    }

    /// Gets a guest by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Guest>> {
        let guest =
            sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(guest)
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Guest>> {
        let guest = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE email = ? AND deleted_at IS NULL",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(guest)
    }

    /// Inserts or refreshes a guest by email inside the caller's
    /// transaction. An existing guest gets the latest name/phone.
    pub async fn upsert_by_email_in(
        conn: &mut SqliteConnection,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> DbResult<Guest> {
        let email = email.trim().to_lowercase();
        let now = Utc::now();

        let existing = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE email = ? AND deleted_at IS NULL",
        )
        .bind(&email)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(mut guest) = existing {
            debug!(id = %guest.id, email = %email, "refreshing existing guest");

            guest.full_name = full_name.trim().to_string();
            guest.phone = phone.map(str::to_string).or(guest.phone);
            guest.updated_at = now;

            sqlx::query("UPDATE guests SET full_name = ?, phone = ?, updated_at = ? WHERE id = ?")
                .bind(&guest.full_name)
                .bind(&guest.phone)
                .bind(guest.updated_at)
                .bind(&guest.id)
                .execute(&mut *conn)
                .await?;

            return Ok(guest);
        }

        let guest = Guest {
            id: new_id(),
            full_name: full_name.trim().to_string(),
            email,
            phone: phone.map(str::to_string),
            notes: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %guest.id, email = %guest.email, "creating guest");

        sqlx::query(
            "INSERT INTO guests (id, full_name, email, phone, notes, deleted_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&guest.id)
        .bind(&guest.full_name)
        .bind(&guest.email)
        .bind(&guest.phone)
        .bind(&guest.notes)
        .bind(guest.deleted_at)
        .bind(guest.created_at)
        .bind(guest.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(guest)
    }

    /// Logical delete: hidden from default reads, retained for audit.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE guests SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Guest", id));
        }

        Ok(())
    }
}
