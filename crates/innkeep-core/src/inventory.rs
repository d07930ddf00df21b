//! # Inventory Movement Engine
//!
//! Items, the append-only movement log, stock takes, and purchase orders.
//!
//! ## Conservation
//! ```text
//!   current_on_hand = Σ signed_delta(movements)
//!
//!   In, Return      → +|qty|
//!   Out, Waste      → −|qty|
//!   Adjustment      → qty as-signed
//!   Transfer        → paired (−qty, +qty) legs sharing one reference
//! ```
//!
//! A movement that would drive on-hand below zero is rejected
//! (`NegativeStock`) for every kind except Adjustment, since stock takes
//! must be able to record reality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{Money, Quantity};

// =============================================================================
// Inventory Item
// =============================================================================

/// A stocked good.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: String,
    pub property_id: String,
    /// Business key, unique ("TOWEL-L", "COFFEE-1KG").
    pub sku: String,
    pub name: String,
    pub category_id: Option<String>,
    /// Unit of measure label ("piece", "kg", "litre").
    pub unit_of_measure: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// Stock on hand, hundredths of a unit. Mutated only together with a
    /// movement append, in the same transaction.
    pub on_hand_hundredths: i64,
    pub min_stock_hundredths: i64,
    pub max_stock_hundredths: i64,
    pub reorder_level_hundredths: i64,
    pub is_perishable: bool,
    pub shelf_life_days: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    #[inline]
    pub fn on_hand(&self) -> Quantity {
        Quantity::from_hundredths(self.on_hand_hundredths)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn reorder_level(&self) -> Quantity {
        Quantity::from_hundredths(self.reorder_level_hundredths)
    }

    /// Whether on-hand has fallen to or below the reorder level.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.on_hand_hundredths <= self.reorder_level_hundredths
    }
}

// =============================================================================
// Movement Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (PO receipt, found stock).
    In,
    /// Goods issued (POS depletion, requisition).
    Out,
    /// Stock-take correction; quantity is taken as-signed.
    Adjustment,
    /// One leg of a paired transfer; quantity is taken as-signed.
    Transfer,
    /// Goods returned to stock (cancelled order).
    Return,
    /// Spoilage, breakage, expiry.
    Waste,
}

impl MovementKind {
    /// Signed on-hand delta this movement applies.
    pub fn signed_delta(self, quantity: Quantity) -> Quantity {
        match self {
            MovementKind::In | MovementKind::Return => quantity.abs(),
            MovementKind::Out | MovementKind::Waste => -quantity.abs(),
            MovementKind::Adjustment | MovementKind::Transfer => quantity,
        }
    }

    /// Only Adjustment may drive on-hand below zero.
    #[inline]
    pub fn allows_negative(self) -> bool {
        matches!(self, MovementKind::Adjustment)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Transfer => "transfer",
            MovementKind::Return => "return",
            MovementKind::Waste => "waste",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One append-only change to an item's on-hand. Never updated, never
/// deleted; survives logical retirement of its item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub item_id: String,
    pub kind: MovementKind,
    /// Hundredths of a unit; sign is meaningful for Adjustment/Transfer.
    pub quantity_hundredths: i64,
    pub unit_cost_cents: i64,
    /// `|quantity| × unit_cost`, rounded half-even.
    pub total_cost_cents: i64,
    /// External document key: order number, PO number, stock-take
    /// reference, or transfer pairing key.
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_hundredths(self.quantity_hundredths)
    }

    #[inline]
    pub fn signed_delta(&self) -> Quantity {
        self.kind.signed_delta(self.quantity())
    }
}

/// Extended movement value: `|qty| × unit_cost`.
pub fn movement_total_cost(unit_cost: Money, quantity: Quantity) -> Money {
    unit_cost.multiply_quantity(quantity.abs())
}

// =============================================================================
// Stock Take
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockTakeStatus {
    Draft,
    Finalized,
}

impl StockTakeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockTakeStatus::Draft => "draft",
            StockTakeStatus::Finalized => "finalized",
        }
    }
}

impl fmt::Display for StockTakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical count batch. Finalizing produces one Adjustment movement
/// per nonzero difference, atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTake {
    pub id: String,
    pub property_id: String,
    /// Human-readable, unique ("ST20260806-3f9a").
    pub reference_number: String,
    pub status: StockTakeStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub started_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One counted item within a stock take. `system_qty` is snapshotted when
/// the count is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTakeLine {
    pub id: String,
    pub stock_take_id: String,
    pub item_id: String,
    pub system_qty_hundredths: i64,
    pub physical_qty_hundredths: i64,
    pub unit_cost_cents: i64,
    /// `physical − system`.
    pub difference_hundredths: i64,
    /// `difference × unit_cost`.
    pub value_difference_cents: i64,
}

impl StockTakeLine {
    #[inline]
    pub fn difference(&self) -> Quantity {
        Quantity::from_hundredths(self.difference_hundredths)
    }
}

/// Count math for a stock-take line: `(difference, value_difference)`.
/// The value difference keeps the sign of the count difference.
pub fn count_difference(
    system: Quantity,
    physical: Quantity,
    unit_cost: Money,
) -> (Quantity, Money) {
    let difference = physical - system;
    let magnitude = unit_cost.multiply_quantity(difference.abs());
    let value = if difference.is_negative() {
        -magnitude
    } else {
        magnitude
    };
    (difference, value)
}

// =============================================================================
// Purchase Orders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Placed,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn can_transition_to(self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, next),
            (Draft, Placed) | (Draft, Cancelled) | (Placed, Received) | (Placed, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Placed => "placed",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supplier order. Receiving appends one In movement per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: String,
    /// Human-readable, unique ("PO20260806-1b2c").
    pub po_number: String,
    pub property_id: String,
    pub supplier_id: String,
    pub status: PurchaseOrderStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub placed_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered item on a PO.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderLine {
    pub id: String,
    pub purchase_order_id: String,
    pub item_id: String,
    pub quantity_hundredths: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
}

impl PurchaseOrderLine {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_hundredths(self.quantity_hundredths)
    }

    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_delta_by_kind() {
        let five = Quantity::from_units(5);
        assert_eq!(MovementKind::In.signed_delta(five).hundredths(), 500);
        assert_eq!(MovementKind::In.signed_delta(-five).hundredths(), 500);
        assert_eq!(MovementKind::Return.signed_delta(five).hundredths(), 500);
        assert_eq!(MovementKind::Out.signed_delta(five).hundredths(), -500);
        assert_eq!(MovementKind::Waste.signed_delta(five).hundredths(), -500);
        assert_eq!(MovementKind::Adjustment.signed_delta(-five).hundredths(), -500);
        assert_eq!(MovementKind::Transfer.signed_delta(-five).hundredths(), -500);
        assert_eq!(MovementKind::Transfer.signed_delta(five).hundredths(), 500);
    }

    #[test]
    fn test_only_adjustment_allows_negative() {
        assert!(MovementKind::Adjustment.allows_negative());
        for kind in [
            MovementKind::In,
            MovementKind::Out,
            MovementKind::Transfer,
            MovementKind::Return,
            MovementKind::Waste,
        ] {
            assert!(!kind.allows_negative());
        }
    }

    #[test]
    fn test_count_difference() {
        let cost = Money::from_cents(250);
        // shortage: system 10, counted 7
        let (diff, value) = count_difference(
            Quantity::from_units(10),
            Quantity::from_units(7),
            cost,
        );
        assert_eq!(diff.hundredths(), -300);
        assert_eq!(value.cents(), -750);

        // overage
        let (diff, value) = count_difference(
            Quantity::from_units(10),
            Quantity::from_units(12),
            cost,
        );
        assert_eq!(diff.hundredths(), 200);
        assert_eq!(value.cents(), 500);

        // exact count: no difference, no adjustment needed
        let (diff, value) = count_difference(
            Quantity::from_units(10),
            Quantity::from_units(10),
            cost,
        );
        assert!(diff.is_zero());
        assert!(value.is_zero());
    }

    #[test]
    fn test_movement_total_cost() {
        let total = movement_total_cost(Money::from_cents(250), Quantity::from_hundredths(-300));
        assert_eq!(total.cents(), 750);
    }

    #[test]
    fn test_po_transitions() {
        use PurchaseOrderStatus::*;
        assert!(Draft.can_transition_to(Placed));
        assert!(Placed.can_transition_to(Received));
        assert!(Placed.can_transition_to(Cancelled));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Received.can_transition_to(Placed));
    }

    #[test]
    fn test_needs_reorder() {
        let now = Utc::now();
        let mut item = InventoryItem {
            id: "i-1".to_string(),
            property_id: "p-1".to_string(),
            sku: "COFFEE-1KG".to_string(),
            name: "Coffee beans 1kg".to_string(),
            category_id: None,
            unit_of_measure: "kg".to_string(),
            cost_price_cents: 1800,
            selling_price_cents: 0,
            on_hand_hundredths: 400,
            min_stock_hundredths: 200,
            max_stock_hundredths: 2000,
            reorder_level_hundredths: 500,
            is_perishable: true,
            shelf_life_days: Some(180),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(item.needs_reorder());
        item.on_hand_hundredths = 600;
        assert!(!item.needs_reorder());
    }
}
