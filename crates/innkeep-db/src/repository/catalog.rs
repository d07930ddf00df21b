//! # Catalog Repository
//!
//! Reference-data CRUD: properties, room types, bed types, floors,
//! amenities, POS categories, menu items, inventory categories, suppliers.
//!
//! Catalog writes are rare administrative actions; they run directly on
//! the pool. Retirement is logical (`is_active = 0`) so live transactional
//! rows keep resolving their references.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use innkeep_core::catalog::{
    Amenity, BedType, Floor, InventoryCategory, MenuItem, PosCategory, Property, RoomType,
    Supplier,
};
use innkeep_core::money::{Money, Quantity};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    pub async fn create_property(&self, name: &str, address: Option<&str>) -> DbResult<Property> {
        let now = Utc::now();
        let property = Property {
            id: new_id(),
            name: name.trim().to_string(),
            address: address.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %property.id, name = %property.name, "creating property");

        sqlx::query(
            "INSERT INTO properties (id, name, address, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&property.id)
        .bind(&property.name)
        .bind(&property.address)
        .bind(property.is_active)
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(property)
    }

    pub async fn get_property(&self, id: &str) -> DbResult<Option<Property>> {
        let property = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }

    // -------------------------------------------------------------------------
    // Room types & physical layout
    // -------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_room_type(
        &self,
        property_id: &str,
        code: &str,
        name: &str,
        base_price: Money,
        max_adults: i64,
        max_children: i64,
        bed_type_id: Option<&str>,
    ) -> DbResult<RoomType> {
        let now = Utc::now();
        let room_type = RoomType {
            id: new_id(),
            property_id: property_id.to_string(),
            code: code.trim().to_uppercase(),
            name: name.trim().to_string(),
            description: None,
            base_price_cents: base_price.cents(),
            max_adults,
            max_children,
            bed_type_id: bed_type_id.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %room_type.id, code = %room_type.code, "creating room type");

        sqlx::query(
            "INSERT INTO room_types (
                id, property_id, code, name, description, base_price_cents,
                max_adults, max_children, bed_type_id, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&room_type.id)
        .bind(&room_type.property_id)
        .bind(&room_type.code)
        .bind(&room_type.name)
        .bind(&room_type.description)
        .bind(room_type.base_price_cents)
        .bind(room_type.max_adults)
        .bind(room_type.max_children)
        .bind(&room_type.bed_type_id)
        .bind(room_type.is_active)
        .bind(room_type.created_at)
        .bind(room_type.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(room_type)
    }

    pub async fn get_room_type(&self, id: &str) -> DbResult<Option<RoomType>> {
        let room_type = sqlx::query_as::<_, RoomType>(
            "SELECT * FROM room_types WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_type)
    }

    pub async fn list_room_types(&self, property_id: &str) -> DbResult<Vec<RoomType>> {
        let room_types = sqlx::query_as::<_, RoomType>(
            "SELECT * FROM room_types WHERE property_id = ? AND is_active = 1 ORDER BY code",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(room_types)
    }

    pub async fn create_bed_type(&self, name: &str) -> DbResult<BedType> {
        let bed_type = BedType {
            id: new_id(),
            name: name.trim().to_string(),
            is_active: true,
        };

        sqlx::query("INSERT INTO bed_types (id, name, is_active) VALUES (?, ?, ?)")
            .bind(&bed_type.id)
            .bind(&bed_type.name)
            .bind(bed_type.is_active)
            .execute(&self.pool)
            .await?;

        Ok(bed_type)
    }

    pub async fn create_floor(&self, property_id: &str, name: &str, level: i64) -> DbResult<Floor> {
        let floor = Floor {
            id: new_id(),
            property_id: property_id.to_string(),
            name: name.trim().to_string(),
            level,
        };

        sqlx::query("INSERT INTO floors (id, property_id, name, level) VALUES (?, ?, ?, ?)")
            .bind(&floor.id)
            .bind(&floor.property_id)
            .bind(&floor.name)
            .bind(floor.level)
            .execute(&self.pool)
            .await?;

        Ok(floor)
    }

    pub async fn create_amenity(&self, name: &str) -> DbResult<Amenity> {
        let amenity = Amenity {
            id: new_id(),
            name: name.trim().to_string(),
            is_active: true,
        };

        sqlx::query("INSERT INTO amenities (id, name, is_active) VALUES (?, ?, ?)")
            .bind(&amenity.id)
            .bind(&amenity.name)
            .bind(amenity.is_active)
            .execute(&self.pool)
            .await?;

        Ok(amenity)
    }

    // -------------------------------------------------------------------------
    // POS catalog
    // -------------------------------------------------------------------------

    pub async fn create_pos_category(&self, name: &str) -> DbResult<PosCategory> {
        let category = PosCategory {
            id: new_id(),
            name: name.trim().to_string(),
            is_active: true,
        };

        sqlx::query("INSERT INTO pos_categories (id, name, is_active) VALUES (?, ?, ?)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.is_active)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Creates a menu item, optionally linked to an inventory item that is
    /// depleted per unit sold.
    pub async fn create_menu_item(
        &self,
        pos_category_id: &str,
        name: &str,
        price: Money,
        inventory_link: Option<(&str, Quantity)>,
    ) -> DbResult<MenuItem> {
        let now = Utc::now();
        let (inventory_item_id, deplete_qty) = match inventory_link {
            Some((item_id, qty)) => (Some(item_id.to_string()), qty.hundredths()),
            None => (None, 0),
        };
        let item = MenuItem {
            id: new_id(),
            pos_category_id: pos_category_id.to_string(),
            name: name.trim().to_string(),
            price_cents: price.cents(),
            inventory_item_id,
            deplete_qty_hundredths: deplete_qty,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "creating menu item");

        sqlx::query(
            "INSERT INTO menu_items (
                id, pos_category_id, name, price_cents, inventory_item_id,
                deplete_qty_hundredths, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.pos_category_id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(&item.inventory_item_id)
        .bind(item.deplete_qty_hundredths)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_menu_item(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item =
            sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(item)
    }

    /// Transaction-scoped menu-item lookup for order creation.
    pub async fn get_menu_item_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<MenuItem>> {
        let item =
            sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Inventory catalog
    // -------------------------------------------------------------------------

    pub async fn create_inventory_category(&self, name: &str) -> DbResult<InventoryCategory> {
        let category = InventoryCategory {
            id: new_id(),
            name: name.trim().to_string(),
            is_active: true,
        };

        sqlx::query("INSERT INTO inventory_categories (id, name, is_active) VALUES (?, ?, ?)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.is_active)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn create_supplier(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            name: name.trim().to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO suppliers (id, name, email, phone, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Logically retires a catalog row; live transactional records keep
    /// their references.
    pub async fn retire(&self, table: CatalogTable, id: &str) -> DbResult<()> {
        let sql = match table {
            CatalogTable::Property => "UPDATE properties SET is_active = 0 WHERE id = ?",
            CatalogTable::RoomType => "UPDATE room_types SET is_active = 0 WHERE id = ?",
            CatalogTable::BedType => "UPDATE bed_types SET is_active = 0 WHERE id = ?",
            CatalogTable::Amenity => "UPDATE amenities SET is_active = 0 WHERE id = ?",
            CatalogTable::PosCategory => "UPDATE pos_categories SET is_active = 0 WHERE id = ?",
            CatalogTable::MenuItem => "UPDATE menu_items SET is_active = 0 WHERE id = ?",
            CatalogTable::InventoryCategory => {
                "UPDATE inventory_categories SET is_active = 0 WHERE id = ?"
            }
            CatalogTable::Supplier => "UPDATE suppliers SET is_active = 0 WHERE id = ?",
        };

        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(table.entity_name(), id));
        }

        Ok(())
    }
}

/// Catalog table selector for [`CatalogRepository::retire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Property,
    RoomType,
    BedType,
    Amenity,
    PosCategory,
    MenuItem,
    InventoryCategory,
    Supplier,
}

impl CatalogTable {
    fn entity_name(self) -> &'static str {
        match self {
            CatalogTable::Property => "Property",
            CatalogTable::RoomType => "RoomType",
            CatalogTable::BedType => "BedType",
            CatalogTable::Amenity => "Amenity",
            CatalogTable::PosCategory => "PosCategory",
            CatalogTable::MenuItem => "MenuItem",
            CatalogTable::InventoryCategory => "InventoryCategory",
            CatalogTable::Supplier => "Supplier",
        }
    }
}
