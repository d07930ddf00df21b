//! # POS Order Engine
//!
//! Orders, line math, and the order state machine.
//!
//! ## Status Machine
//! ```text
//!   Pending ──► Confirmed ──► Preparing ──► Ready ──► Served
//!      │            │             │           │
//!      └────────────┴─────────────┴───────────┴──► Cancelled
//! ```
//!
//! Confirmation depletes linked inventory; cancellation after confirmation
//! returns it (idempotently). Served and Cancelled are terminal.
//!
//! ## Totals
//! `subtotal = Σ line.total`, `tax = subtotal × tax_rate`,
//! `service = subtotal × service_rate`,
//! `total = subtotal + tax + service − discount`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{Money, Quantity, Rate};

// =============================================================================
// Order Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    RoomService,
    Takeaway,
    Delivery,
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    /// Forward progression plus cancellation from any pre-Served state.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, Served) => true,
            (Pending | Confirmed | Preparing | Ready, Cancelled) => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Unpaid,
    Paid,
    /// Settled by a folio charge rather than tender.
    ChargedToRoom,
}

impl OrderPaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderPaymentStatus::Unpaid => "unpaid",
            OrderPaymentStatus::Paid => "paid",
            OrderPaymentStatus::ChargedToRoom => "charged_to_room",
        }
    }
}

impl fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// POS Order
// =============================================================================

/// A point-of-sale order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosOrder {
    pub id: String,
    /// Human-readable, unique ("POS20260806-0042").
    pub order_number: String,
    pub property_id: String,
    pub order_type: OrderType,
    pub guest_id: Option<String>,
    /// Link required for room-charge settlement.
    pub folio_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub service_charge_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PosOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// POS Order Line
// =============================================================================

/// One menu item on an order. Price is snapshotted at order time so later
/// menu edits cannot rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosOrderLine {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Menu item name at order time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    pub quantity_hundredths: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl PosOrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_hundredths(self.quantity_hundredths)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Extended line amount: `unit_price × quantity`, rounded half-even.
pub fn line_total(unit_price: Money, quantity: Quantity) -> Money {
    unit_price.multiply_quantity(quantity)
}

// =============================================================================
// Totals
// =============================================================================

/// Computed order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub service_charge: Money,
    pub discount: Money,
    pub total: Money,
}

/// Calculates order totals from line amounts and the configured rates.
///
/// Tax and service charge are each derived from the subtotal, not from
/// per-line rounded values.
pub fn calculate_totals(
    line_totals: &[Money],
    tax_rate: Rate,
    service_rate: Rate,
    discount: Money,
) -> OrderTotals {
    let subtotal: Money = line_totals.iter().copied().sum();
    let tax = subtotal.apply_rate(tax_rate);
    let service_charge = subtotal.apply_rate(service_rate);
    let total = subtotal + tax + service_charge - discount;
    OrderTotals {
        subtotal,
        tax,
        service_charge,
        discount,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
