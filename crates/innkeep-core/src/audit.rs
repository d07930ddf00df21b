//! # Night Audit
//!
//! The once-per-day closing pass. One record per (property, business
//! date); once completed its counters are immutable and a second run
//! returns the stored record unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Day Counters
// =============================================================================

/// Rolled-up counters for one business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayCounters {
    /// Check-in records still CheckedIn at end of day.
    pub occupied_rooms: i64,
    /// Σ Folio.total_charges for folios created that day, in cents.
    pub revenue_cents: i64,
    /// Check-ins performed that day.
    pub arrivals: i64,
    /// Check-outs performed that day.
    pub departures: i64,
    /// Reservations with that check-in date marked NoShow.
    pub no_shows: i64,
}

// =============================================================================
// Night Audit Record
// =============================================================================

/// The persisted result of one nightly close.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NightAuditRecord {
    pub id: String,
    pub property_id: String,
    /// Unique together with `property_id`.
    pub business_date: NaiveDate,
    pub performed_by: String,
    pub occupied_rooms: i64,
    pub revenue_cents: i64,
    pub arrivals: i64,
    pub departures: i64,
    pub no_shows: i64,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NightAuditRecord {
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }

    pub fn counters(&self) -> DayCounters {
        DayCounters {
            occupied_rooms: self.occupied_rooms,
            revenue_cents: self.revenue_cents,
            arrivals: self.arrivals,
            departures: self.departures,
            no_shows: self.no_shows,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_round_trip() {
        let record = NightAuditRecord {
            id: "na-1".to_string(),
            property_id: "p-1".to_string(),
            business_date: "2026-08-06".parse().unwrap(),
            performed_by: "acc-1".to_string(),
            occupied_rooms: 12,
            revenue_cents: 184_000,
            arrivals: 4,
            departures: 3,
            no_shows: 1,
            is_completed: true,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let counters = record.counters();
        assert_eq!(counters.arrivals, 4);
        assert_eq!(counters.departures, 3);
        assert_eq!(counters.no_shows, 1);
        assert_eq!(record.revenue().cents(), 184_000);
    }
}
