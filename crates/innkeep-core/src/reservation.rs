//! # Reservations
//!
//! Booking records and the reservation state machine.
//!
//! ## Status DAG
//! ```text
//!   Pending ──► Confirmed ──► CheckedIn ──► CheckedOut
//!      │            │
//!      │            ├──► Cancelled
//!      └──► Cancelled
//!                   └──► NoShow
//! ```
//!
//! Dates are half-open `[check_in, check_out)`: a stay departing on the
//! day another arrives does not conflict. Dates are immutable once the
//! reservation is Confirmed; the rate is captured at creation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Reservation Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    NoShow,
    Cancelled,
}

impl ReservationStatus {
    /// Whether the DAG permits moving to `next`. Transitions are
    /// monotonic: terminal states (CheckedOut, NoShow, Cancelled) have no
    /// exits.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (CheckedIn, CheckedOut)
        )
    }

    /// Whether this status blocks a room for its date range.
    #[inline]
    pub fn blocks_room(self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::CheckedIn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::NoShow => "no_show",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Booking Source
// =============================================================================

/// Where the booking originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    Direct,
    Phone,
    Email,
    Website,
    WalkIn,
}

// =============================================================================
// Reservation
// =============================================================================

/// A booking for a room type over a date range.
///
/// `room_id` stays null until check-in assigns a physical room (walk-ins
/// assign immediately). Never hard-deleted; `deleted_at` tombstones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: String,
    pub property_id: String,
    pub guest_id: String,
    pub room_type_id: String,
    pub room_id: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: i64,
    pub children: i64,
    /// Rate captured at creation, in cents per night.
    pub nightly_rate_cents: i64,
    pub total_nights: i64,
    pub status: ReservationStatus,
    pub source: BookingSource,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    #[inline]
    pub fn nightly_rate(&self) -> Money {
        Money::from_cents(self.nightly_rate_cents)
    }

    /// Total room rate for the stay: `nightly_rate × total_nights`.
    #[inline]
    pub fn total_rate(&self) -> Money {
        self.nightly_rate().multiply_count(self.total_nights)
    }

    /// Whether this reservation's dates overlap `[check_in, check_out)`.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        ranges_overlap(self.check_in_date, self.check_out_date, check_in, check_out)
    }
}

// =============================================================================
// Date Math
// =============================================================================

/// Number of nights in `[check_in, check_out)`.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// Half-open interval overlap: `[a_in, a_out)` against `[b_in, b_out)`.
/// Back-to-back stays (a_out == b_in) do not overlap.
pub fn ranges_overlap(
    a_in: NaiveDate,
    a_out: NaiveDate,
    b_in: NaiveDate,
    b_out: NaiveDate,
) -> bool {
    a_in < b_out && b_in < a_out
}

/// Validates a stay range: at least one night, dates ordered.
pub fn validate_stay_range(check_in: NaiveDate, check_out: NaiveDate) -> CoreResult<i64> {
    let nights = nights_between(check_in, check_out);
    if nights < 1 {
        return Err(ValidationError::InvalidDateRange {
            field: "check_in_date..check_out_date".to_string(),
        }
        .into());
    }
    Ok(nights)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_transition_dag() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(CheckedIn.can_transition_to(CheckedOut));

        // terminal states have no exits
        for terminal in [CheckedOut, NoShow, Cancelled] {
            for next in [Pending, Confirmed, CheckedIn, CheckedOut, NoShow, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        // no skipping straight to checked-in
        assert!(!Pending.can_transition_to(CheckedIn));
        // no un-cancelling
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_nights_between() {
        assert_eq!(nights_between(d("2026-08-06"), d("2026-08-08")), 2);
        assert_eq!(nights_between(d("2026-08-06"), d("2026-08-06")), 0);
    }

    #[test]
    fn test_half_open_overlap() {
        // same-day turnover: out == in does not conflict
        assert!(!ranges_overlap(
            d("2026-08-01"),
            d("2026-08-05"),
            d("2026-08-05"),
            d("2026-08-07"),
        ));
        assert!(ranges_overlap(
            d("2026-08-01"),
            d("2026-08-05"),
            d("2026-08-04"),
            d("2026-08-07"),
        ));
        assert!(ranges_overlap(
            d("2026-08-01"),
            d("2026-08-10"),
            d("2026-08-03"),
            d("2026-08-04"),
        ));
    }

    #[test]
    fn test_validate_stay_range() {
        assert_eq!(validate_stay_range(d("2026-08-06"), d("2026-08-08")).unwrap(), 2);
        assert!(validate_stay_range(d("2026-08-06"), d("2026-08-06")).is_err());
        assert!(validate_stay_range(d("2026-08-08"), d("2026-08-06")).is_err());
    }
}
