//! # Catalog Types
//!
//! Immutable-by-convention reference data: properties, room types, bed
//! types, floors, amenities, POS categories and menu items, inventory
//! categories, and suppliers.
//!
//! Catalog rows live independently of the transactional records that
//! reference them. Retirement is logical (`is_active = false`) so live
//! folios, orders, and movements keep resolving their references.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an immutable UUID `id` used for relations, plus a
//! human-facing business key where one exists (room-type code, SKU).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::money::Quantity;

// =============================================================================
// Property
// =============================================================================

/// A property (hotel site). Multi-property consolidation is out of scope;
/// the id exists to scope rooms, reservations, locks, and the night audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Property {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Room Types & Physical Layout
// =============================================================================

/// A bookable room category (Standard, Deluxe, Suite, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RoomType {
    pub id: String,
    pub property_id: String,
    /// Business code, unique within the property ("STD", "DLX").
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Default nightly price in cents; rooms may override.
    pub base_price_cents: i64,
    pub max_adults: i64,
    pub max_children: i64,
    pub bed_type_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomType {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// A bed configuration (Single, Double, Twin, King).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BedType {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// A floor within a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Floor {
    pub id: String,
    pub property_id: String,
    pub name: String,
    /// Ordering key (ground floor = 0).
    pub level: i64,
}

/// A room amenity (WiFi, Minibar, Balcony).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Amenity {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

// =============================================================================
// POS Catalog
// =============================================================================

/// A POS menu grouping (Beverages, Kitchen, Spa).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosCategory {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// A sellable POS item.
///
/// The optional inventory link drives the POS → stock bridge: confirming
/// an order depletes `deplete_qty` of the linked item per unit sold, and
/// cancellation returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub pos_category_id: String,
    pub name: String,
    pub price_cents: i64,
    pub inventory_item_id: Option<String>,
    /// Stock depleted per unit sold, in hundredths of the item's unit.
    pub deplete_qty_hundredths: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn deplete_qty(&self) -> Quantity {
        Quantity::from_hundredths(self.deplete_qty_hundredths)
    }

    /// Whether selling this item moves stock.
    #[inline]
    pub fn tracks_stock(&self) -> bool {
        self.inventory_item_id.is_some() && self.deplete_qty_hundredths > 0
    }
}

// =============================================================================
// Inventory Catalog
// =============================================================================

/// An inventory grouping (Linen, Food & Beverage, Cleaning).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryCategory {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// A goods supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn menu_item(inventory: Option<&str>, deplete: i64) -> MenuItem {
        MenuItem {
            id: "m-1".to_string(),
            pos_category_id: "cat-1".to_string(),
            name: "Club Sandwich".to_string(),
            price_cents: 1200,
            inventory_item_id: inventory.map(str::to_string),
            deplete_qty_hundredths: deplete,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_menu_item_stock_tracking() {
        assert!(menu_item(Some("i-1"), 100).tracks_stock());
        assert!(!menu_item(None, 100).tracks_stock());
        assert!(!menu_item(Some("i-1"), 0).tracks_stock());
    }
}
