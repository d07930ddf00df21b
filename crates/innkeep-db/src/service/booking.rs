//! # Booking Service
//!
//! Reservation creation and the booking DAG transitions. Dates and rate
//! are captured at creation; after Confirmed they are immutable.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::info;

use innkeep_core::money::Money;
use innkeep_core::reservation::{
    validate_stay_range, BookingSource, Reservation, ReservationStatus,
};
use innkeep_core::validation::{validate_guest_counts, validate_positive_amount};
use innkeep_core::{Actor, ActivityEvent, CoreError, Scope};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::new_id;
use crate::repository::reservation::ReservationRepository;

/// Parameters for creating a reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub property_id: String,
    pub guest_id: String,
    pub room_type_id: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: i64,
    pub children: i64,
    pub nightly_rate: Money,
    pub source: BookingSource,
    /// Create directly as Confirmed (deposit taken, card guaranteed).
    pub confirmed: bool,
    pub notes: Option<String>,
}

/// Reservation lifecycle operations.
#[derive(Debug, Clone)]
pub struct BookingService {
    db: Database,
}

impl BookingService {
    pub fn new(db: Database) -> Self {
        BookingService { db }
    }

    /// Creates a reservation as Pending or Confirmed. The total rate is
    /// captured now: `nightly_rate × nights`.
    pub async fn create(&self, new: NewReservation, actor: &Actor) -> ServiceResult<Reservation> {
        actor.require(Scope::FrontDesk)?;

        let nights = validate_stay_range(new.check_in_date, new.check_out_date)?;
        validate_positive_amount("nightly_rate", new.nightly_rate).map_err(CoreError::from)?;
        validate_guest_counts(new.adults, new.children).map_err(CoreError::from)?;

        let guest = self.db.guests().get_by_id(&new.guest_id).await?;
        if guest.is_none() {
            return Err(CoreError::not_found("Guest", &new.guest_id).into());
        }
        let room_type = self.db.catalog().get_room_type(&new.room_type_id).await?;
        if room_type.is_none() {
            return Err(CoreError::not_found("RoomType", &new.room_type_id).into());
        }

        let now = Utc::now();
        let status = if new.confirmed {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };
        let reservation = Reservation {
            id: new_id(),
            property_id: new.property_id,
            guest_id: new.guest_id,
            room_type_id: new.room_type_id,
            room_id: None,
            check_in_date: new.check_in_date,
            check_out_date: new.check_out_date,
            adults: new.adults,
            children: new.children,
            nightly_rate_cents: new.nightly_rate.cents(),
            total_nights: nights,
            status,
            source: new.source,
            notes: new.notes,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.pool().begin().await?;

        ReservationRepository::insert_in(&mut *tx, &reservation).await?;
        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "reservation",
                &reservation.id,
                "reservation_created",
                json!({
                    "status": reservation.status,
                    "check_in_date": reservation.check_in_date,
                    "check_out_date": reservation.check_out_date,
                    "nightly_rate_cents": reservation.nightly_rate_cents,
                    "total_nights": reservation.total_nights,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(id = %reservation.id, status = %reservation.status, "reservation created");
        Ok(reservation)
    }

    /// Pending → Confirmed.
    pub async fn confirm(&self, reservation_id: &str, actor: &Actor) -> ServiceResult<Reservation> {
        self.transition(
            reservation_id,
            ReservationStatus::Confirmed,
            "reservation_confirmed",
            actor,
        )
        .await
    }

    /// Pending | Confirmed → Cancelled.
    pub async fn cancel(&self, reservation_id: &str, actor: &Actor) -> ServiceResult<Reservation> {
        self.transition(
            reservation_id,
            ReservationStatus::Cancelled,
            "reservation_cancelled",
            actor,
        )
        .await
    }

    /// Confirmed → NoShow (outside the night audit, e.g. a same-day call).
    pub async fn no_show(&self, reservation_id: &str, actor: &Actor) -> ServiceResult<Reservation> {
        self.transition(
            reservation_id,
            ReservationStatus::NoShow,
            "reservation_no_show",
            actor,
        )
        .await
    }

    /// Shared DAG-guarded transition.
    async fn transition(
        &self,
        reservation_id: &str,
        to: ReservationStatus,
        event_kind: &str,
        actor: &Actor,
    ) -> ServiceResult<Reservation> {
        actor.require(Scope::FrontDesk)?;

        let mut tx = self.db.pool().begin().await?;

        let mut reservation = ReservationRepository::get_by_id_in(&mut *tx, reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id))?;

        if !reservation.status.can_transition_to(to) {
            return Err(CoreError::invalid_transition(
                "Reservation",
                reservation_id,
                reservation.status,
                to,
            )
            .into());
        }

        ReservationRepository::update_status_in(&mut *tx, reservation_id, reservation.status, to)
            .await?;
        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "reservation",
                reservation_id,
                event_kind,
                json!({ "from": reservation.status, "to": to }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(id = %reservation_id, from = %reservation.status, to = %to, "reservation transition");
        reservation.status = to;
        reservation.updated_at = Utc::now();
        Ok(reservation)
    }
}
