//! # Check-In Records
//!
//! The fact of a guest occupying an assigned room, distinct from the
//! reservation that authorized it. One-to-one with a reservation; creating
//! one also creates the stay's folio.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Check-In Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    CheckedIn,
    CheckedOut,
    /// Checked out before the reservation's check-out date.
    EarlyDeparture,
    NoShow,
}

impl CheckInStatus {
    /// CheckedOut and EarlyDeparture are both departed stays; everything
    /// downstream (sealed folio, dirty room, audit departures) treats them
    /// alike.
    #[inline]
    pub fn is_departed(self) -> bool {
        matches!(self, CheckInStatus::CheckedOut | CheckInStatus::EarlyDeparture)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckInStatus::CheckedIn => "checked_in",
            CheckInStatus::CheckedOut => "checked_out",
            CheckInStatus::EarlyDeparture => "early_departure",
            CheckInStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Check-In Record
// =============================================================================

/// An occupied-room record. Owns the stay's folio (they soft-delete
/// together).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CheckInRecord {
    pub id: String,
    /// Unique: at most one record per reservation.
    pub reservation_id: String,
    pub property_id: String,
    pub room_id: String,
    pub number_of_guests: i64,
    pub special_requests: Option<String>,
    /// Incidental deposit taken at the desk, in cents.
    pub deposit_cents: i64,
    pub status: CheckInStatus,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: String,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub checked_out_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckInRecord {
    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }
}

// =============================================================================
// Folio Numbering
// =============================================================================

/// Builds a folio number: `prefix + yyyymmdd + first 6 hex chars of the
/// record id`. Example: `F20260806a1b2c3`.
///
/// Collisions are absorbed by the unique index on `folio_number`; the
/// caller retries once with a fresh suffix source.
pub fn folio_number(prefix: &str, on: NaiveDate, record_id: &str) -> String {
    let hex: String = record_id
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .take(6)
        .collect();
    format!("{}{}{}", prefix, on.format("%Y%m%d"), hex)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folio_number_format() {
        let date = "2026-08-06".parse().unwrap();
        let number = folio_number("F", date, "a1b2c3d4-e5f6-7890-abcd-ef0123456789");
        assert_eq!(number, "F20260806a1b2c3");
    }

    #[test]
    fn test_folio_number_skips_dashes() {
        let date = "2026-08-06".parse().unwrap();
        // uuid whose first hex chars straddle a dash
        let number = folio_number("F", date, "ab-cd-ef-01-23-45");
        assert_eq!(number, "F20260806abcdef");
    }

    #[test]
    fn test_departed_statuses() {
        assert!(CheckInStatus::CheckedOut.is_departed());
        assert!(CheckInStatus::EarlyDeparture.is_departed());
        assert!(!CheckInStatus::CheckedIn.is_departed());
        assert!(!CheckInStatus::NoShow.is_departed());
    }
}
