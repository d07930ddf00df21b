//! # Money Module
//!
//! Fixed-point arithmetic for the folio and POS ledgers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Money(i64)     cents           $10.99        == 1099               │
//! │  Rate(u32)      basis points    10%           == 1000 bps           │
//! │  Quantity(i64)  hundredths      2.50 units    == 250                │
//! │                                                                     │
//! │  Every monetary value in the system flows through Money.            │
//! │  Rate application rounds HALF-EVEN (round half to even), so         │
//! │  repeated tax recomputation cannot drift the ledger.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use innkeep_core::money::{Money, Rate};
//!
//! let room = Money::from_cents(20000);      // $200.00
//! let tax = room.apply_rate(Rate::from_bps(1000)); // 10%
//! assert_eq!(tax.cents(), 2000);            // $20.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Rounding
// =============================================================================

/// Divides `num / den` rounding half to even ("bankers rounding").
///
/// `den` must be positive. Widened to i128 by callers so the intermediate
/// product cannot overflow.
fn div_round_half_even(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    let q = num.div_euclid(den);
    let r = num.rem_euclid(den);
    let twice = r * 2;
    if twice > den || (twice == den && q % 2 != 0) {
        q + 1
    } else {
        q
    }
}

// =============================================================================
// Money
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so refunds, credits, and negative folio balances (overpayment
/// carried as credit) are representable. Currency-agnostic: the configured
/// currency code is display metadata only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a rate (tax, service charge) rounding half-even.
    ///
    /// ## Example
    /// ```rust
    /// use innkeep_core::money::{Money, Rate};
    ///
    /// // $0.25 at 10% = $0.025 -> rounds to $0.02 (2 is even)
    /// assert_eq!(Money::from_cents(25).apply_rate(Rate::from_bps(1000)).cents(), 2);
    /// // $0.35 at 10% = $0.035 -> rounds to $0.04
    /// assert_eq!(Money::from_cents(35).apply_rate(Rate::from_bps(1000)).cents(), 4);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = div_round_half_even(self.0 as i128 * rate.bps() as i128, 10_000);
        Money(cents as i64)
    }

    /// Multiplies by a whole-number count (nights, line quantity).
    #[inline]
    pub const fn multiply_count(&self, count: i64) -> Self {
        Money(self.0 * count)
    }

    /// Multiplies by a fixed-point quantity, rounding half-even.
    ///
    /// ## Example
    /// ```rust
    /// use innkeep_core::money::{Money, Quantity};
    ///
    /// let unit = Money::from_cents(1200); // $12.00
    /// let line = unit.multiply_quantity(Quantity::from_units(2));
    /// assert_eq!(line.cents(), 2400);
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        let cents = div_round_half_even(self.0 as i128 * qty.hundredths() as i128, 100);
        Money(cents as i64)
    }
}

/// Debug-friendly display. UI formatting (currency symbol, locale) is the
/// caller's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate in basis points (1 bps = 0.01%).
///
/// 1000 bps = 10% (default tax), 500 bps = 5% (default service charge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a fraction (0.10 = 10%), for configuration parsing.
    pub fn from_fraction(fraction: f64) -> Self {
        Rate((fraction * 10_000.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A fixed-point quantity in hundredths of a unit (decimal(10,2)).
///
/// Signed: stock adjustments and transfer-out legs carry negative values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * 100)
    }

    /// Creates a quantity from hundredths of a unit.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Returns the quantity in hundredths of a unit.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Quantity(self.0.abs())
    }

    /// Fixed-point product of two quantities, rounding half-even.
    /// (Line quantity × per-unit depletion, both in hundredths.)
    pub fn multiply(&self, other: Quantity) -> Quantity {
        Quantity(div_round_half_even(self.0 as i128 * other.0 as i128, 100) as i64)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(a.multiply_count(3).cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 400);
    }

    #[test]
    fn test_apply_rate_exact() {
        // $200.00 at 10% = $20.00
        let tax = Money::from_cents(20000).apply_rate(Rate::from_bps(1000));
        assert_eq!(tax.cents(), 2000);
        // $24.00 at 5% = $1.20
        let service = Money::from_cents(2400).apply_rate(Rate::from_bps(500));
        assert_eq!(service.cents(), 120);
    }

    #[test]
    fn test_apply_rate_rounds_half_even() {
        let ten_pct = Rate::from_bps(1000);
        // 0.25 * 10% = 0.025 -> 0.02 (towards even)
        assert_eq!(Money::from_cents(25).apply_rate(ten_pct).cents(), 2);
        // 0.35 * 10% = 0.035 -> 0.04 (towards even)
        assert_eq!(Money::from_cents(35).apply_rate(ten_pct).cents(), 4);
        // -0.25 * 10% = -0.025 -> -0.02
        assert_eq!(Money::from_cents(-25).apply_rate(ten_pct).cents(), -2);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit = Money::from_cents(1200);
        assert_eq!(unit.multiply_quantity(Quantity::from_units(2)).cents(), 2400);
        // 2.50 * $2.99 = $7.475 -> $7.48 (half-even: 7 is odd, rounds up)
        let unit = Money::from_cents(299);
        assert_eq!(
            unit.multiply_quantity(Quantity::from_hundredths(250)).cents(),
            748
        );
    }

    #[test]
    fn test_rate_from_fraction() {
        assert_eq!(Rate::from_fraction(0.10).bps(), 1000);
        assert_eq!(Rate::from_fraction(0.05).bps(), 500);
        assert_eq!(Rate::from_fraction(0.0825).bps(), 825);
    }

    #[test]
    fn test_quantity_multiply() {
        // 2 sold × 1.50 per unit = 3.00 depleted
        let depleted = Quantity::from_units(2).multiply(Quantity::from_hundredths(150));
        assert_eq!(depleted.hundredths(), 300);
        // 0.50 × 0.25 = 0.125 -> 0.12 (half-even)
        let q = Quantity::from_hundredths(50).multiply(Quantity::from_hundredths(25));
        assert_eq!(q.hundredths(), 12);
    }

    #[test]
    fn test_quantity_display_and_math() {
        assert_eq!(format!("{}", Quantity::from_units(3)), "3.00");
        assert_eq!(format!("{}", Quantity::from_hundredths(-125)), "-1.25");
        assert_eq!(
            (Quantity::from_units(3) - Quantity::from_units(5)).hundredths(),
            -200
        );
        assert_eq!((-Quantity::from_units(2)).hundredths(), -200);
    }

    /// Repeated recompute-from-totals must be stable: applying the rate to
    /// the same base twice yields the same tax, so the ledger cannot drift.
    #[test]
    fn test_recompute_stability() {
        let base = Money::from_cents(22760);
        let rate = Rate::from_bps(1000);
        let once = base.apply_rate(rate);
        let twice = base.apply_rate(rate);
        assert_eq!(once, twice);
    }
}
