//! # Folio Repository
//!
//! Folio headers, charge lines, and payments. The derived totals on the
//! header are only ever written together, from a recomputed
//! [`innkeep_core::folio::Folio`], inside the mutating transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::folio::{Folio, FolioCharge};
use innkeep_core::payment::Payment;

use crate::error::{DbError, DbResult};

/// Repository for folios, folio charges, and payments.
#[derive(Debug, Clone)]
pub struct FolioRepository {
    pool: SqlitePool,
}

impl FolioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FolioRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Folio headers
    // -------------------------------------------------------------------------

    /// Inserts a folio inside the caller's transaction. UNIQUE indexes
    /// cover `checkin_record_id` (one folio per stay) and `folio_number`.
    pub async fn insert_in(conn: &mut SqliteConnection, folio: &Folio) -> DbResult<()> {
        debug!(id = %folio.id, folio_number = %folio.folio_number, "inserting folio");

        sqlx::query(
            "INSERT INTO folios (
                id, checkin_record_id, folio_number,
                room_charges_cents, incidental_charges_cents, tax_amount_cents,
                total_charges_cents, payments_received_cents, balance_cents,
                is_settled, settled_at, deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&folio.id)
        .bind(&folio.checkin_record_id)
        .bind(&folio.folio_number)
        .bind(folio.room_charges_cents)
        .bind(folio.incidental_charges_cents)
        .bind(folio.tax_amount_cents)
        .bind(folio.total_charges_cents)
        .bind(folio.payments_received_cents)
        .bind(folio.balance_cents)
        .bind(folio.is_settled)
        .bind(folio.settled_at)
        .bind(folio.deleted_at)
        .bind(folio.created_at)
        .bind(folio.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a folio by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Folio>> {
        let folio =
            sqlx::query_as::<_, Folio>("SELECT * FROM folios WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(folio)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Folio>> {
        let folio =
            sqlx::query_as::<_, Folio>("SELECT * FROM folios WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(folio)
    }

    /// Explicit escape hatch: includes soft-deleted rows.
    pub async fn get_with_deleted(&self, id: &str) -> DbResult<Option<Folio>> {
        let folio = sqlx::query_as::<_, Folio>("SELECT * FROM folios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(folio)
    }

    /// The folio for a stay.
    pub async fn get_by_checkin(&self, checkin_record_id: &str) -> DbResult<Option<Folio>> {
        let folio = sqlx::query_as::<_, Folio>(
            "SELECT * FROM folios WHERE checkin_record_id = ? AND deleted_at IS NULL",
        )
        .bind(checkin_record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folio)
    }

    /// Transaction-scoped variant of [`Self::get_by_checkin`].
    pub async fn get_by_checkin_in(
        conn: &mut SqliteConnection,
        checkin_record_id: &str,
    ) -> DbResult<Option<Folio>> {
        let folio = sqlx::query_as::<_, Folio>(
            "SELECT * FROM folios WHERE checkin_record_id = ? AND deleted_at IS NULL",
        )
        .bind(checkin_record_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(folio)
    }

    /// Lookup by the printed folio number.
    pub async fn get_by_number(&self, folio_number: &str) -> DbResult<Option<Folio>> {
        let folio = sqlx::query_as::<_, Folio>(
            "SELECT * FROM folios WHERE folio_number = ? AND deleted_at IS NULL",
        )
        .bind(folio_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folio)
    }

    /// All live folios, newest first (default scope).
    pub async fn list(&self) -> DbResult<Vec<Folio>> {
        let folios = sqlx::query_as::<_, Folio>(
            "SELECT * FROM folios WHERE deleted_at IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(folios)
    }

    /// All folios including tombstoned ones.
    pub async fn list_with_deleted(&self) -> DbResult<Vec<Folio>> {
        let folios =
            sqlx::query_as::<_, Folio>("SELECT * FROM folios ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(folios)
    }

    /// Writes the recomputed totals back to the header.
    pub async fn update_totals_in(conn: &mut SqliteConnection, folio: &Folio) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE folios SET
                room_charges_cents = ?,
                incidental_charges_cents = ?,
                tax_amount_cents = ?,
                total_charges_cents = ?,
                payments_received_cents = ?,
                balance_cents = ?,
                updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(folio.room_charges_cents)
        .bind(folio.incidental_charges_cents)
        .bind(folio.tax_amount_cents)
        .bind(folio.total_charges_cents)
        .bind(folio.payments_received_cents)
        .bind(folio.balance_cents)
        .bind(Utc::now())
        .bind(&folio.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Folio", &folio.id));
        }

        Ok(())
    }

    /// Seals the folio at settlement. Guarded: sealing twice is a no-row
    /// update surfaced as NotFound, which the service maps to FolioSealed.
    pub async fn seal_in(
        conn: &mut SqliteConnection,
        folio_id: &str,
        settled_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE folios SET is_settled = 1, settled_at = ?, updated_at = ?
             WHERE id = ? AND is_settled = 0 AND deleted_at IS NULL",
        )
        .bind(settled_at)
        .bind(Utc::now())
        .bind(folio_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Folio (open)", folio_id));
        }

        Ok(())
    }

    /// Revenue rolled up for the night audit: Σ total_charges of folios
    /// created on the business date, scoped to the property via the stay.
    pub async fn sum_revenue_on_in(
        conn: &mut SqliteConnection,
        property_id: &str,
        business_date: NaiveDate,
    ) -> DbResult<i64> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(f.total_charges_cents) FROM folios f
             JOIN checkin_records c ON c.id = f.checkin_record_id
             WHERE c.property_id = ?
               AND substr(f.created_at, 1, 10) = ?
               AND f.deleted_at IS NULL",
        )
        .bind(property_id)
        .bind(business_date.format("%Y-%m-%d").to_string())
        .fetch_one(&mut *conn)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    // -------------------------------------------------------------------------
    // Charges
    // -------------------------------------------------------------------------

    /// Appends a charge line inside the caller's transaction.
    pub async fn insert_charge_in(
        conn: &mut SqliteConnection,
        charge: &FolioCharge,
    ) -> DbResult<()> {
        debug!(
            folio_id = %charge.folio_id,
            kind = %charge.kind,
            amount = charge.amount_cents,
            "appending folio charge"
        );

        sqlx::query(
            "INSERT INTO folio_charges (
                id, folio_id, kind, description, amount_cents,
                quantity_hundredths, tax_inclusive, posted_by, deleted_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&charge.id)
        .bind(&charge.folio_id)
        .bind(charge.kind)
        .bind(&charge.description)
        .bind(charge.amount_cents)
        .bind(charge.quantity_hundredths)
        .bind(charge.tax_inclusive)
        .bind(&charge.posted_by)
        .bind(charge.deleted_at)
        .bind(charge.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Live charge lines for a folio, oldest first (recompute input).
    pub async fn charges_in(
        conn: &mut SqliteConnection,
        folio_id: &str,
    ) -> DbResult<Vec<FolioCharge>> {
        let charges = sqlx::query_as::<_, FolioCharge>(
            "SELECT * FROM folio_charges
             WHERE folio_id = ? AND deleted_at IS NULL
             ORDER BY created_at, id",
        )
        .bind(folio_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(charges)
    }

    /// Pool-side variant of [`Self::charges_in`].
    pub async fn charges(&self, folio_id: &str) -> DbResult<Vec<FolioCharge>> {
        let mut conn = self.pool.acquire().await?;
        Self::charges_in(&mut conn, folio_id).await
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Records a payment row inside the caller's transaction.
    pub async fn insert_payment_in(
        conn: &mut SqliteConnection,
        payment: &Payment,
    ) -> DbResult<()> {
        debug!(
            folio_id = ?payment.folio_id,
            order_id = ?payment.order_id,
            amount = payment.amount_cents,
            "recording payment"
        );

        sqlx::query(
            "INSERT INTO payments (
                id, folio_id, order_id, method, amount_cents,
                reference, received_by, deleted_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payment.id)
        .bind(&payment.folio_id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.reference)
        .bind(&payment.received_by)
        .bind(payment.deleted_at)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Payments recorded against a folio, oldest first.
    pub async fn payments_for_folio(&self, folio_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments
             WHERE folio_id = ? AND deleted_at IS NULL
             ORDER BY created_at, id",
        )
        .bind(folio_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Payments recorded against a POS order, oldest first.
    pub async fn payments_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments
             WHERE order_id = ? AND deleted_at IS NULL
             ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Σ payment amounts against a POS order, inside the caller's
    /// transaction.
    pub async fn payments_total_for_order_in(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<i64> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payments
             WHERE order_id = ? AND deleted_at IS NULL",
        )
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    // -------------------------------------------------------------------------
    // Soft delete
    // -------------------------------------------------------------------------

    /// Tombstones a folio and its owned charge lines together.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE folios SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Folio", id));
        }

        sqlx::query(
            "UPDATE folio_charges SET deleted_at = ? WHERE folio_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Administrative hard delete: removes the folio row and its owned
    /// lines permanently.
    pub async fn hard_delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM payments WHERE folio_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM folio_charges WHERE folio_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM folios WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Folio", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
