//! # POS Order Repository
//!
//! Order headers and snapshot lines. Status updates are guarded the same
//! way as reservations: `WHERE status = ?` so concurrent transitions lose
//! loudly.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use innkeep_core::pos::{OrderPaymentStatus, OrderStatus, PosOrder, PosOrderLine};

use crate::error::{DbError, DbResult};

/// Repository for POS orders and lines.
#[derive(Debug, Clone)]
pub struct PosOrderRepository {
    pool: SqlitePool,
}

impl PosOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PosOrderRepository { pool }
    }

    /// Inserts an order header inside the caller's transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, order: &PosOrder) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "inserting POS order");

        sqlx::query(
            "INSERT INTO pos_orders (
                id, order_number, property_id, order_type, guest_id, folio_id,
                subtotal_cents, tax_cents, service_charge_cents, discount_cents,
                total_cents, status, payment_status, notes, created_by,
                deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.property_id)
        .bind(order.order_type)
        .bind(&order.guest_id)
        .bind(&order.folio_id)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.service_charge_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.deleted_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a snapshot line inside the caller's transaction.
    pub async fn insert_line_in(conn: &mut SqliteConnection, line: &PosOrderLine) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO pos_order_lines (
                id, order_id, menu_item_id, name_snapshot, unit_price_cents,
                quantity_hundredths, line_total_cents, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(&line.menu_item_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_cents)
        .bind(line.quantity_hundredths)
        .bind(line.line_total_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets an order by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PosOrder>> {
        let order = sqlx::query_as::<_, PosOrder>(
            "SELECT * FROM pos_orders WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PosOrder>> {
        let order = sqlx::query_as::<_, PosOrder>(
            "SELECT * FROM pos_orders WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    /// Lookup by the printed order number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<PosOrder>> {
        let order = sqlx::query_as::<_, PosOrder>(
            "SELECT * FROM pos_orders WHERE order_number = ? AND deleted_at IS NULL",
        )
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lines for an order, oldest first.
    pub async fn lines(&self, order_id: &str) -> DbResult<Vec<PosOrderLine>> {
        let lines = sqlx::query_as::<_, PosOrderLine>(
            "SELECT * FROM pos_order_lines WHERE order_id = ? ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Transaction-scoped variant of [`Self::lines`].
    pub async fn lines_in(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<PosOrderLine>> {
        let lines = sqlx::query_as::<_, PosOrderLine>(
            "SELECT * FROM pos_order_lines WHERE order_id = ? ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Status-guarded transition inside the caller's transaction.
    pub async fn update_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE pos_orders SET status = ?, updated_at = ?
             WHERE id = ? AND status = ? AND deleted_at IS NULL",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PosOrder", id));
        }

        Ok(())
    }

    /// Writes the settlement state.
    pub async fn update_payment_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        payment_status: OrderPaymentStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE pos_orders SET payment_status = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(payment_status)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PosOrder", id));
        }

        Ok(())
    }

    /// Links the order to a folio (required before room-charge payment
    /// when the order was opened without one).
    pub async fn link_folio_in(
        conn: &mut SqliteConnection,
        id: &str,
        folio_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE pos_orders SET folio_id = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(folio_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PosOrder", id));
        }

        Ok(())
    }

    /// Logical delete.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE pos_orders SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PosOrder", id));
        }

        Ok(())
    }
}

/// Generates an order number: `POS` + yyyymmdd + 4 hex chars.
///
/// Example: `POS20260806-1b2c`. Collisions hit the UNIQUE index and are
/// retried once by the service with a fresh suffix.
pub fn generate_order_number() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect();
    format!("POS{}-{}", date_part, suffix)
}
