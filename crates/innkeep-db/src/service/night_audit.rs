//! # Night Audit Service
//!
//! The once-per-day closing pass.
//!
//! ```text
//! run(property, date)
//!   1. completed record for (property, date) exists? return it unchanged
//!   2. Confirmed reservations with check_in_date < date  -> NoShow
//!   3. counters: occupied, revenue, arrivals, departures, no-shows
//!   4. INSERT completed record (UNIQUE property+date absorbs races)
//! ```
//!
//! `run ∘ run = run`: the second invocation returns the stored record
//! with identical counters.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::info;

use innkeep_core::audit::NightAuditRecord;
use innkeep_core::{Actor, ActivityEvent, Scope};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::audit::NightAuditRepository;
use crate::repository::checkin::CheckInRepository;
use crate::repository::folio::FolioRepository;
use crate::repository::new_id;
use crate::repository::reservation::ReservationRepository;

/// The nightly close.
#[derive(Debug, Clone)]
pub struct NightAuditService {
    db: Database,
}

impl NightAuditService {
    pub fn new(db: Database) -> Self {
        NightAuditService { db }
    }

    /// Runs the audit for one (property, business date). Idempotent: a
    /// completed record is returned unchanged, counters immutable.
    pub async fn run(
        &self,
        property_id: &str,
        business_date: NaiveDate,
        actor: &Actor,
    ) -> ServiceResult<NightAuditRecord> {
        actor.require(Scope::NightAudit)?;

        let mut tx = self.db.pool().begin().await?;

        if let Some(existing) =
            NightAuditRepository::find_in(&mut *tx, property_id, business_date).await?
        {
            if existing.is_completed {
                info!(
                    property_id = %property_id,
                    business_date = %business_date,
                    "night audit already completed"
                );
                return Ok(existing);
            }
        }

        let started_at = Utc::now();

        // Lingering Confirmed arrivals from before this business date are
        // closed out as no-shows before the counters roll.
        let marked =
            ReservationRepository::mark_no_shows_before_in(&mut *tx, property_id, business_date)
                .await?;

        let occupied_rooms = CheckInRepository::count_in_house_in(&mut *tx, property_id).await?;
        let revenue_cents =
            FolioRepository::sum_revenue_on_in(&mut *tx, property_id, business_date).await?;
        let arrivals =
            CheckInRepository::count_arrivals_on_in(&mut *tx, property_id, business_date).await?;
        let departures =
            CheckInRepository::count_departures_on_in(&mut *tx, property_id, business_date).await?;
        let no_shows =
            ReservationRepository::count_no_shows_on_in(&mut *tx, property_id, business_date)
                .await?;

        let now = Utc::now();
        let record = NightAuditRecord {
            id: new_id(),
            property_id: property_id.to_string(),
            business_date,
            performed_by: actor.id.clone(),
            occupied_rooms,
            revenue_cents,
            arrivals,
            departures,
            no_shows,
            is_completed: true,
            started_at,
            completed_at: Some(now),
            created_at: now,
        };

        if let Err(err) = NightAuditRepository::insert_in(&mut *tx, &record).await {
            // A concurrent run won the (property, date) uniqueness race:
            // abandon this pass and return the committed record.
            if matches!(err, DbError::UniqueViolation { .. }) {
                drop(tx);
                let existing = self
                    .db
                    .audits()
                    .find(property_id, business_date)
                    .await?
                    .ok_or(ServiceError::Db(err))?;
                return Ok(existing);
            }
            return Err(err.into());
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "night_audit",
                &record.id,
                "night_audit_completed",
                json!({
                    "business_date": business_date,
                    "occupied_rooms": occupied_rooms,
                    "revenue_cents": revenue_cents,
                    "arrivals": arrivals,
                    "departures": departures,
                    "no_shows": no_shows,
                    "marked_no_show": marked,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(
            property_id = %property_id,
            business_date = %business_date,
            arrivals = arrivals,
            departures = departures,
            no_shows = no_shows,
            "night audit completed"
        );
        Ok(record)
    }
}
