//! # Inventory Repository
//!
//! Items and the append-only movement ledger.
//!
//! The on-hand column is only ever written together with a movement
//! append, in the same transaction. Conservation (`on_hand = Σ signed
//! deltas`) is a property of the write path, and
//! [`InventoryRepository::sum_signed_deltas`] lets callers re-check it.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::inventory::{InventoryItem, StockMovement};
use innkeep_core::money::{Money, Quantity};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// Parameters for creating an inventory item.
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub property_id: String,
    pub sku: String,
    pub name: String,
    pub category_id: Option<String>,
    pub unit_of_measure: String,
    pub cost_price: Money,
    pub selling_price: Money,
    pub min_stock: Quantity,
    pub max_stock: Quantity,
    pub reorder_level: Quantity,
    pub is_perishable: bool,
    pub shelf_life_days: Option<i64>,
}

/// Repository for inventory items and stock movements.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Creates an item with zero opening stock. Opening balances arrive as
    /// `In` movements so conservation holds from the first row.
    pub async fn create_item(&self, new: NewInventoryItem) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: new_id(),
            property_id: new.property_id,
            sku: new.sku.trim().to_uppercase(),
            name: new.name.trim().to_string(),
            category_id: new.category_id,
            unit_of_measure: new.unit_of_measure,
            cost_price_cents: new.cost_price.cents(),
            selling_price_cents: new.selling_price.cents(),
            on_hand_hundredths: 0,
            min_stock_hundredths: new.min_stock.hundredths(),
            max_stock_hundredths: new.max_stock.hundredths(),
            reorder_level_hundredths: new.reorder_level.hundredths(),
            is_perishable: new.is_perishable,
            shelf_life_days: new.shelf_life_days,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, sku = %item.sku, "creating inventory item");

        sqlx::query(
            "INSERT INTO inventory_items (
                id, property_id, sku, name, category_id, unit_of_measure,
                cost_price_cents, selling_price_cents, on_hand_hundredths,
                min_stock_hundredths, max_stock_hundredths, reorder_level_hundredths,
                is_perishable, shelf_life_days, deleted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.property_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category_id)
        .bind(&item.unit_of_measure)
        .bind(item.cost_price_cents)
        .bind(item.selling_price_cents)
        .bind(item.on_hand_hundredths)
        .bind(item.min_stock_hundredths)
        .bind(item.max_stock_hundredths)
        .bind(item.reorder_level_hundredths)
        .bind(item.is_perishable)
        .bind(item.shelf_life_days)
        .bind(item.deleted_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by ID (default scope: excludes soft-deleted).
    pub async fn get_item(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Transaction-scoped lookup.
    pub async fn get_item_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    pub async fn get_item_by_sku(&self, sku: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE sku = ? AND deleted_at IS NULL",
        )
        .bind(sku.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Items of a property ordered by SKU.
    pub async fn list_items(&self, property_id: &str) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items
             WHERE property_id = ? AND deleted_at IS NULL
             ORDER BY sku",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items at or below their reorder level (dashboard hook).
    pub async fn list_below_reorder(&self, property_id: &str) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items
             WHERE property_id = ?
               AND deleted_at IS NULL
               AND on_hand_hundredths <= reorder_level_hundredths
             ORDER BY sku",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Logical retirement. Movements referencing the item survive.
    pub async fn soft_delete_item(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE inventory_items SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Movements
    // -------------------------------------------------------------------------

    /// Appends a movement row inside the caller's transaction. The caller
    /// updates on-hand in the same transaction.
    pub async fn insert_movement_in(
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        debug!(
            item_id = %movement.item_id,
            kind = %movement.kind,
            qty = movement.quantity_hundredths,
            "appending stock movement"
        );

        sqlx::query(
            "INSERT INTO stock_movements (
                id, item_id, kind, quantity_hundredths, unit_cost_cents,
                total_cost_cents, reference, notes, performed_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&movement.id)
        .bind(&movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity_hundredths)
        .bind(movement.unit_cost_cents)
        .bind(movement.total_cost_cents)
        .bind(&movement.reference)
        .bind(&movement.notes)
        .bind(&movement.performed_by)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes the new on-hand value alongside a movement append.
    pub async fn update_on_hand_in(
        conn: &mut SqliteConnection,
        item_id: &str,
        on_hand: Quantity,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE inventory_items SET on_hand_hundredths = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(on_hand.hundredths())
        .bind(Utc::now())
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", item_id));
        }

        Ok(())
    }

    /// Movement ledger for an item, oldest first.
    pub async fn movements_for(&self, item_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE item_id = ? ORDER BY created_at, id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements carrying a document reference (order number, PO number,
    /// stock-take reference), inside the caller's transaction.
    pub async fn movements_by_reference_in(
        conn: &mut SqliteConnection,
        reference: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE reference = ? ORDER BY created_at, id",
        )
        .bind(reference)
        .fetch_all(&mut *conn)
        .await?;

        Ok(movements)
    }

    /// Σ signed deltas over the item's full ledger: the conservation
    /// check (`== on_hand_hundredths` at all times).
    pub async fn sum_signed_deltas(&self, item_id: &str) -> DbResult<i64> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(CASE
                 WHEN kind IN ('in', 'return') THEN abs(quantity_hundredths)
                 WHEN kind IN ('out', 'waste') THEN -abs(quantity_hundredths)
                 ELSE quantity_hundredths
             END)
             FROM stock_movements WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum.unwrap_or(0))
    }
}
