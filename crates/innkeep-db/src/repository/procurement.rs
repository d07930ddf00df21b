//! # Procurement Repositories
//!
//! Stock takes (physical counts) and purchase orders: the two document
//! types that feed the movement ledger from outside the POS.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use innkeep_core::inventory::{
    PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus, StockTake, StockTakeLine,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Stock Takes
// =============================================================================

/// Repository for stock-take batches.
#[derive(Debug, Clone)]
pub struct StockTakeRepository {
    pool: SqlitePool,
}

impl StockTakeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockTakeRepository { pool }
    }

    /// Inserts a stock-take header inside the caller's transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, take: &StockTake) -> DbResult<()> {
        debug!(id = %take.id, reference = %take.reference_number, "inserting stock take");

        sqlx::query(
            "INSERT INTO stock_takes (
                id, property_id, reference_number, status, notes, created_by,
                started_at, finalized_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&take.id)
        .bind(&take.property_id)
        .bind(&take.reference_number)
        .bind(take.status)
        .bind(&take.notes)
        .bind(&take.created_by)
        .bind(take.started_at)
        .bind(take.finalized_at)
        .bind(take.created_at)
        .bind(take.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a counted line inside the caller's transaction.
    pub async fn insert_line_in(conn: &mut SqliteConnection, line: &StockTakeLine) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO stock_take_lines (
                id, stock_take_id, item_id, system_qty_hundredths,
                physical_qty_hundredths, unit_cost_cents,
                difference_hundredths, value_difference_cents
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&line.id)
        .bind(&line.stock_take_id)
        .bind(&line.item_id)
        .bind(line.system_qty_hundredths)
        .bind(line.physical_qty_hundredths)
        .bind(line.unit_cost_cents)
        .bind(line.difference_hundredths)
        .bind(line.value_difference_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockTake>> {
        let take = sqlx::query_as::<_, StockTake>("SELECT * FROM stock_takes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(take)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockTake>> {
        let take = sqlx::query_as::<_, StockTake>("SELECT * FROM stock_takes WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(take)
    }

    /// Counted lines for a batch.
    pub async fn lines(&self, stock_take_id: &str) -> DbResult<Vec<StockTakeLine>> {
        let lines = sqlx::query_as::<_, StockTakeLine>(
            "SELECT * FROM stock_take_lines WHERE stock_take_id = ? ORDER BY id",
        )
        .bind(stock_take_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Transaction-scoped variant of [`Self::lines`].
    pub async fn lines_in(
        conn: &mut SqliteConnection,
        stock_take_id: &str,
    ) -> DbResult<Vec<StockTakeLine>> {
        let lines = sqlx::query_as::<_, StockTakeLine>(
            "SELECT * FROM stock_take_lines WHERE stock_take_id = ? ORDER BY id",
        )
        .bind(stock_take_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Guarded finalize: only a Draft batch can finalize, exactly once.
    pub async fn mark_finalized_in(
        conn: &mut SqliteConnection,
        id: &str,
        finalized_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE stock_takes SET status = 'finalized', finalized_at = ?, updated_at = ?
             WHERE id = ? AND status = 'draft'",
        )
        .bind(finalized_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockTake (draft)", id));
        }

        Ok(())
    }
}

/// Generates a stock-take reference: `ST` + yyyymmdd + 4 hex chars.
pub fn generate_stock_take_reference() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect();
    format!("ST{}-{}", date_part, suffix)
}

// =============================================================================
// Purchase Orders
// =============================================================================

/// Repository for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// Inserts a PO header inside the caller's transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, po: &PurchaseOrder) -> DbResult<()> {
        debug!(id = %po.id, po_number = %po.po_number, "inserting purchase order");

        sqlx::query(
            "INSERT INTO purchase_orders (
                id, po_number, property_id, supplier_id, status, notes,
                created_by, placed_at, received_at, deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&po.id)
        .bind(&po.po_number)
        .bind(&po.property_id)
        .bind(&po.supplier_id)
        .bind(po.status)
        .bind(&po.notes)
        .bind(&po.created_by)
        .bind(po.placed_at)
        .bind(po.received_at)
        .bind(po.deleted_at)
        .bind(po.created_at)
        .bind(po.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a PO line inside the caller's transaction.
    pub async fn insert_line_in(
        conn: &mut SqliteConnection,
        line: &PurchaseOrderLine,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO purchase_order_lines (
                id, purchase_order_id, item_id, quantity_hundredths,
                unit_cost_cents, line_total_cents
            ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&line.id)
        .bind(&line.purchase_order_id)
        .bind(&line.item_id)
        .bind(line.quantity_hundredths)
        .bind(line.unit_cost_cents)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a PO by ID (default scope: excludes soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(po)
    }

    /// Transaction-scoped lookup.
    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<PurchaseOrder>> {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(po)
    }

    /// Lines for a PO.
    pub async fn lines_in(
        conn: &mut SqliteConnection,
        purchase_order_id: &str,
    ) -> DbResult<Vec<PurchaseOrderLine>> {
        let lines = sqlx::query_as::<_, PurchaseOrderLine>(
            "SELECT * FROM purchase_order_lines WHERE purchase_order_id = ? ORDER BY id",
        )
        .bind(purchase_order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Status-guarded transition with the matching timestamp write.
    pub async fn update_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> DbResult<()> {
        let now = Utc::now();
        let result = match to {
            PurchaseOrderStatus::Placed => {
                sqlx::query(
                    "UPDATE purchase_orders SET status = ?, placed_at = ?, updated_at = ?
                     WHERE id = ? AND status = ? AND deleted_at IS NULL",
                )
                .bind(to)
                .bind(now)
                .bind(now)
                .bind(id)
                .bind(from)
                .execute(&mut *conn)
                .await?
            }
            PurchaseOrderStatus::Received => {
                sqlx::query(
                    "UPDATE purchase_orders SET status = ?, received_at = ?, updated_at = ?
                     WHERE id = ? AND status = ? AND deleted_at IS NULL",
                )
                .bind(to)
                .bind(now)
                .bind(now)
                .bind(id)
                .bind(from)
                .execute(&mut *conn)
                .await?
            }
            _ => {
                sqlx::query(
                    "UPDATE purchase_orders SET status = ?, updated_at = ?
                     WHERE id = ? AND status = ? AND deleted_at IS NULL",
                )
                .bind(to)
                .bind(now)
                .bind(id)
                .bind(from)
                .execute(&mut *conn)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PurchaseOrder", id));
        }

        Ok(())
    }
}

/// Generates a PO number: `PO` + yyyymmdd + 4 hex chars.
pub fn generate_po_number() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect();
    format!("PO{}-{}", date_part, suffix)
}
