//! # Folio Engine
//!
//! The running ledger attached to an active check-in.
//!
//! ## Ledger Invariants
//! ```text
//! 1. total_charges     = room_charges + incidental_charges + tax_amount
//! 2. balance           = total_charges - payments_received
//! 3. incidental_charges = Σ amounts of non-room charges
//! ```
//!
//! Totals are recomputed from the charge rows on every mutation. Tax is
//! derived from the running bases, never summed from per-line rounded
//! values, so repeated rounding cannot violate invariant 1.
//!
//! Charges posted from POS room-charge payments arrive with POS tax and
//! service already inside the amount; they are stored `tax_inclusive` and
//! excluded from the folio tax base.
//!
//! Sealing: check-out settlement freezes the folio. Any further charge or
//! payment is a `FolioSealed` error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Quantity, Rate};

// =============================================================================
// Charge Kind
// =============================================================================

/// Classification of a folio charge line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    Room,
    Food,
    Laundry,
    Spa,
    Minibar,
    Phone,
    Internet,
    Parking,
    Other,
}

impl ChargeKind {
    /// Room charges accrue to `room_charges`; everything else is
    /// incidental (invariant 3).
    #[inline]
    pub fn is_room(self) -> bool {
        matches!(self, ChargeKind::Room)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChargeKind::Room => "room",
            ChargeKind::Food => "food",
            ChargeKind::Laundry => "laundry",
            ChargeKind::Spa => "spa",
            ChargeKind::Minibar => "minibar",
            ChargeKind::Phone => "phone",
            ChargeKind::Internet => "internet",
            ChargeKind::Parking => "parking",
            ChargeKind::Other => "other",
        }
    }
}

impl fmt::Display for ChargeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Folio
// =============================================================================

/// The stay ledger. One-to-one with a check-in record; the folio number is
/// the human-readable key printed on the guest bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Folio {
    pub id: String,
    /// Unique: exactly one folio per check-in record.
    pub checkin_record_id: String,
    pub folio_number: String,
    pub room_charges_cents: i64,
    pub incidental_charges_cents: i64,
    pub tax_amount_cents: i64,
    pub total_charges_cents: i64,
    pub payments_received_cents: i64,
    pub balance_cents: i64,
    pub is_settled: bool,
    pub settled_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folio {
    #[inline]
    pub fn room_charges(&self) -> Money {
        Money::from_cents(self.room_charges_cents)
    }

    #[inline]
    pub fn incidental_charges(&self) -> Money {
        Money::from_cents(self.incidental_charges_cents)
    }

    #[inline]
    pub fn tax_amount(&self) -> Money {
        Money::from_cents(self.tax_amount_cents)
    }

    #[inline]
    pub fn total_charges(&self) -> Money {
        Money::from_cents(self.total_charges_cents)
    }

    #[inline]
    pub fn payments_received(&self) -> Money {
        Money::from_cents(self.payments_received_cents)
    }

    /// Outstanding balance. Negative means a credit (overpayment is
    /// carried, never capped).
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Fails with `FolioSealed` once the folio is settled.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_settled {
            Err(CoreError::FolioSealed {
                folio_id: self.id.clone(),
            })
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Folio Charge
// =============================================================================

/// An append-only charge line on a folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FolioCharge {
    pub id: String,
    pub folio_id: String,
    pub kind: ChargeKind,
    pub description: String,
    /// Extended line amount in cents.
    pub amount_cents: i64,
    /// Informational quantity, hundredths of a unit.
    pub quantity_hundredths: i64,
    /// True when the amount already carries its own tax (POS room
    /// charges); excluded from the folio tax base.
    pub tax_inclusive: bool,
    pub posted_by: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FolioCharge {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_hundredths(self.quantity_hundredths)
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// =============================================================================
// Recomputation
// =============================================================================

/// Rebuilds every derived total on the folio from its charge rows and the
/// configured tax rate, then re-derives the balance.
///
/// Called inside the same transaction as every charge/payment mutation;
/// by construction the result satisfies the ledger invariants.
pub fn recompute(folio: &mut Folio, charges: &[FolioCharge], tax_rate: Rate) {
    let room: Money = charges
        .iter()
        .filter(|c| c.is_live() && c.kind.is_room())
        .map(FolioCharge::amount)
        .sum();
    let incidental: Money = charges
        .iter()
        .filter(|c| c.is_live() && !c.kind.is_room())
        .map(FolioCharge::amount)
        .sum();
    let taxable_incidental: Money = charges
        .iter()
        .filter(|c| c.is_live() && !c.kind.is_room() && !c.tax_inclusive)
        .map(FolioCharge::amount)
        .sum();

    let tax = (room + taxable_incidental).apply_rate(tax_rate);
    let total = room + incidental + tax;

    folio.room_charges_cents = room.cents();
    folio.incidental_charges_cents = incidental.cents();
    folio.tax_amount_cents = tax.cents();
    folio.total_charges_cents = total.cents();
    folio.balance_cents = (total - folio.payments_received()).cents();
}

/// Records a received payment and re-derives the balance. Overpayment is
/// allowed and carried as a credit (balance goes negative).
pub fn apply_payment(folio: &mut Folio, amount: Money) {
    folio.payments_received_cents += amount.cents();
    folio.balance_cents = (folio.total_charges() - folio.payments_received()).cents();
}

/// Whether the ledger invariants hold for the folio against its charge rows.
/// Re-verified inside each mutating transaction (debug builds assert it).
pub fn invariants_hold(folio: &Folio, charges: &[FolioCharge]) -> bool {
    let incidental: Money = charges
        .iter()
        .filter(|c| c.is_live() && !c.kind.is_room())
        .map(FolioCharge::amount)
        .sum();

    folio.total_charges()
        == folio.room_charges() + folio.incidental_charges() + folio.tax_amount()
        && folio.balance() == folio.total_charges() - folio.payments_received()
        && folio.incidental_charges() == incidental
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn folio() -> Folio {
        let now = Utc::now();
        Folio {
            id: "f-1".to_string(),
            checkin_record_id: "ci-1".to_string(),
            folio_number: "F20260806a1b2c3".to_string(),
            room_charges_cents: 0,
            incidental_charges_cents: 0,
            tax_amount_cents: 0,
            total_charges_cents: 0,
            payments_received_cents: 0,
            balance_cents: 0,
            is_settled: false,
            settled_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn charge(kind: ChargeKind, cents: i64, tax_inclusive: bool) -> FolioCharge {
        FolioCharge {
            id: uuid::Uuid::new_v4().to_string(),
            folio_id: "f-1".to_string(),
            kind,
            description: kind.to_string(),
            amount_cents: cents,
            quantity_hundredths: 100,
            tax_inclusive,
            posted_by: "user-1".to_string(),
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_room_only_recompute() {
        // two nights at $100.00, 10% tax
        let mut f = folio();
        let charges = vec![charge(ChargeKind::Room, 20000, false)];
        recompute(&mut f, &charges, Rate::from_bps(1000));

        assert_eq!(f.room_charges_cents, 20000);
        assert_eq!(f.incidental_charges_cents, 0);
        assert_eq!(f.tax_amount_cents, 2000);
        assert_eq!(f.total_charges_cents, 22000);
        assert_eq!(f.balance_cents, 22000);
        assert!(invariants_hold(&f, &charges));
    }

    #[test]
    fn test_taxable_incidental_recompute() {
        let mut f = folio();
        let charges = vec![
            charge(ChargeKind::Room, 20000, false),
            charge(ChargeKind::Minibar, 1500, false),
        ];
        recompute(&mut f, &charges, Rate::from_bps(1000));

        assert_eq!(f.incidental_charges_cents, 1500);
        // tax over room + taxable incidental
        assert_eq!(f.tax_amount_cents, 2150);
        assert_eq!(f.total_charges_cents, 23650);
        assert!(invariants_hold(&f, &charges));
    }

    #[test]
    fn test_tax_inclusive_charge_moves_total_by_exactly_its_amount() {
        let mut f = folio();
        let mut charges = vec![charge(ChargeKind::Room, 20000, false)];
        recompute(&mut f, &charges, Rate::from_bps(1000));
        let before = f.total_charges_cents;

        // POS room charge: $27.60 already carries POS tax + service
        charges.push(charge(ChargeKind::Food, 2760, true));
        recompute(&mut f, &charges, Rate::from_bps(1000));

        assert_eq!(f.total_charges_cents - before, 2760);
        assert_eq!(f.incidental_charges_cents, 2760);
        assert!(invariants_hold(&f, &charges));
    }

    #[test]
    fn test_payment_and_credit() {
        let mut f = folio();
        let charges = vec![charge(ChargeKind::Room, 20000, false)];
        recompute(&mut f, &charges, Rate::from_bps(1000));

        apply_payment(&mut f, Money::from_cents(22000));
        assert_eq!(f.balance_cents, 0);

        // overpayment carried as credit, never capped
        apply_payment(&mut f, Money::from_cents(500));
        assert_eq!(f.balance_cents, -500);
        assert!(invariants_hold(&f, &charges));
    }

    #[test]
    fn test_charge_then_equal_payment_returns_to_zero() {
        let mut f = folio();
        let charges = vec![charge(ChargeKind::Spa, 4200, true)];
        recompute(&mut f, &charges, Rate::from_bps(1000));
        apply_payment(&mut f, Money::from_cents(4200));
        assert_eq!(f.balance_cents, 0);
    }

    #[test]
    fn test_sealed_folio_rejects() {
        let mut f = folio();
        f.is_settled = true;
        assert!(matches!(f.ensure_open(), Err(CoreError::FolioSealed { .. })));
    }

    #[test]
    fn test_soft_deleted_charges_are_excluded() {
        let mut f = folio();
        let mut voided = charge(ChargeKind::Minibar, 1500, false);
        voided.deleted_at = Some(Utc::now());
        let charges = vec![charge(ChargeKind::Room, 20000, false), voided];
        recompute(&mut f, &charges, Rate::from_bps(1000));
        assert_eq!(f.incidental_charges_cents, 0);
        assert_eq!(f.total_charges_cents, 22000);
    }
}
