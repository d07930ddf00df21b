//! # Rooms
//!
//! Per-property rooms and the room-status machine.
//!
//! ## Status Machine
//! ```text
//!          ┌──────────────────────────────────────┐
//!          ▼                                      │
//!   Available ◄──── Cleaning ◄──► Dirty ◄──► Available
//!       │                           ▲
//!       │  check-in                 │  check-out
//!       ▼                           │
//!    Occupied ──────────────────────┘
//!
//!   any non-Occupied ──► Maintenance / OutOfOrder ──► Available|Dirty|Cleaning
//! ```
//!
//! `Occupied` is owned by the check-in machine: housekeeping transitions
//! can neither enter nor leave it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Room Status
// =============================================================================

/// Operational status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Clean and bookable.
    Available,
    /// A guest is checked in. Set only by check-in, cleared only by check-out.
    Occupied,
    /// Needs housekeeping after a departure.
    Dirty,
    /// Housekeeping in progress.
    Cleaning,
    /// Under maintenance, not bookable.
    Maintenance,
    /// Out of order, not bookable.
    OutOfOrder,
}

impl RoomStatus {
    /// Whether a room in this status can be assigned at check-in.
    #[inline]
    pub fn is_bookable(self) -> bool {
        matches!(self, RoomStatus::Available)
    }

    /// Whether a housekeeping/maintenance status change to `next` is
    /// permitted. `Occupied` is excluded on both sides; the check-in
    /// machine mutates it directly.
    pub fn can_transition_to(self, next: RoomStatus) -> bool {
        use RoomStatus::*;
        if self == next {
            return false;
        }
        match (self, next) {
            (Occupied, _) | (_, Occupied) => false,
            (_, Maintenance) | (_, OutOfOrder) => true,
            (Available, Dirty) => true,
            (Dirty, Available) | (Dirty, Cleaning) => true,
            (Cleaning, Dirty) | (Cleaning, Available) => true,
            (Maintenance, Available) | (Maintenance, Dirty) | (Maintenance, Cleaning) => true,
            (OutOfOrder, Available) | (OutOfOrder, Dirty) | (OutOfOrder, Cleaning) => true,
            _ => false,
        }
    }

    /// Stable snake_case name, matching the stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Dirty => "dirty",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::OutOfOrder => "out_of_order",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Room
// =============================================================================

/// A physical room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Room {
    pub id: String,
    pub property_id: String,
    pub floor_id: Option<String>,
    /// Unique within the property ("101", "1204-A").
    pub room_number: String,
    pub room_type_id: String,
    pub status: RoomStatus,
    /// Nightly price in cents; overrides the room-type base price.
    pub base_price_cents: i64,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_housekeeping_cycle() {
        assert!(RoomStatus::Dirty.can_transition_to(RoomStatus::Cleaning));
        assert!(RoomStatus::Cleaning.can_transition_to(RoomStatus::Available));
        assert!(RoomStatus::Cleaning.can_transition_to(RoomStatus::Dirty));
        assert!(RoomStatus::Available.can_transition_to(RoomStatus::Dirty));
        assert!(RoomStatus::Dirty.can_transition_to(RoomStatus::Available));
    }

    #[test]
    fn test_maintenance_reachable_from_anywhere_but_occupied() {
        for status in [
            RoomStatus::Available,
            RoomStatus::Dirty,
            RoomStatus::Cleaning,
            RoomStatus::OutOfOrder,
        ] {
            assert!(status.can_transition_to(RoomStatus::Maintenance));
        }
        assert!(!RoomStatus::Occupied.can_transition_to(RoomStatus::Maintenance));
    }

    #[test]
    fn test_occupied_is_owned_by_checkin_machine() {
        assert!(!RoomStatus::Available.can_transition_to(RoomStatus::Occupied));
        assert!(!RoomStatus::Occupied.can_transition_to(RoomStatus::Dirty));
    }

    #[test]
    fn test_only_available_is_bookable() {
        assert!(RoomStatus::Available.is_bookable());
        for status in [
            RoomStatus::Occupied,
            RoomStatus::Dirty,
            RoomStatus::Cleaning,
            RoomStatus::Maintenance,
            RoomStatus::OutOfOrder,
        ] {
            assert!(!status.is_bookable());
        }
    }

    #[test]
    fn test_self_transition_rejected() {
        assert!(!RoomStatus::Dirty.can_transition_to(RoomStatus::Dirty));
    }
}
