//! # Front Desk Service
//!
//! Check-in, check-out, and walk-in: the operations that tie the
//! reservation DAG, the room status machine, and the folio together.
//!
//! ## Check-in
//! ```text
//! acquire property lock
//!   BEGIN
//!     reservation must be Confirmed, stay must have started
//!     room: explicit or first from find_available (NoRoomAvailable)
//!     INSERT checkin_record
//!     INSERT folio  (folio_number = prefix + yyyymmdd + 6 hex of id)
//!     INSERT room-charge line (rate × nights), recompute with tax
//!     room    -> Occupied
//!     reservation -> CheckedIn (+ room assigned)
//!     APPEND guest_checkin
//!   COMMIT
//! release lock
//! ```
//!
//! Check-out settles (optionally with an inline payment), seals the
//! folio, frees the room to Dirty. Walk-in compresses guest upsert,
//! reservation, check-in, and folio into one transaction.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use innkeep_core::checkin::{folio_number, CheckInRecord, CheckInStatus};
use innkeep_core::folio::{self, ChargeKind, Folio, FolioCharge};
use innkeep_core::money::{Money, Quantity};
use innkeep_core::payment::{Payment, PaymentMethod};
use innkeep_core::reservation::{BookingSource, Reservation, ReservationStatus};
use innkeep_core::room::RoomStatus;
use innkeep_core::validation::{validate_email, validate_guest_counts, validate_name};
use innkeep_core::{Actor, ActivityEvent, CoreError, PmsConfig, Scope};

use crate::error::{DbError, ServiceResult};
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::checkin::CheckInRepository;
use crate::repository::folio::FolioRepository;
use crate::repository::guest::GuestRepository;
use crate::repository::new_id;
use crate::repository::reservation::ReservationRepository;
use crate::repository::room::RoomRepository;

/// Parameters for checking in a reservation.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub reservation_id: String,
    /// Explicit room; `None` auto-assigns from availability.
    pub room_id: Option<String>,
    pub number_of_guests: i64,
    pub special_requests: Option<String>,
    pub deposit: Money,
}

/// Parameters for checking out a stay.
#[derive(Debug, Clone)]
pub struct CheckOutRequest {
    pub checkin_record_id: String,
    /// Seal the folio on departure. Requires balance ≤ 0 (credit ok)
    /// after the optional inline payment.
    pub settle_folio: bool,
    /// Settlement tender taken at the desk.
    pub payment: Option<SettlementPayment>,
}

/// Inline settlement tender for check-out.
#[derive(Debug, Clone)]
pub struct SettlementPayment {
    pub method: PaymentMethod,
    pub amount: Money,
    pub reference: Option<String>,
}

/// Parameters for a walk-in (no prior reservation).
#[derive(Debug, Clone)]
pub struct WalkInRequest {
    pub property_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub room_type_id: String,
    pub nights: i64,
    pub adults: i64,
    pub children: i64,
    /// Overrides the assigned room's base price when set.
    pub nightly_rate: Option<Money>,
    pub number_of_guests: i64,
    pub special_requests: Option<String>,
    pub deposit: Money,
}

/// Check-in / check-out state machine.
#[derive(Debug, Clone)]
pub struct FrontDeskService {
    db: Database,
}

impl FrontDeskService {
    pub fn new(db: Database) -> Self {
        FrontDeskService { db }
    }

    /// Checks in a confirmed reservation, creating the stay record and
    /// its folio and occupying the room.
    pub async fn check_in(
        &self,
        request: CheckInRequest,
        actor: &Actor,
    ) -> ServiceResult<(CheckInRecord, Folio)> {
        actor.require(Scope::FrontDesk)?;

        // The property id is needed for the lock; the reservation is
        // re-read inside the transaction after the lock is held.
        let property_id = self
            .db
            .reservations()
            .get_by_id(&request.reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", &request.reservation_id))?
            .property_id;

        let locks = self.db.locks();
        let _property_guard = locks.property(&property_id).await;

        let mut tx = self.db.pool().begin().await?;

        let reservation = ReservationRepository::get_by_id_in(&mut *tx, &request.reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", &request.reservation_id))?;

        if reservation.status != ReservationStatus::Confirmed {
            return Err(CoreError::invalid_transition(
                "Reservation",
                &reservation.id,
                reservation.status,
                ReservationStatus::CheckedIn,
            )
            .into());
        }
        let today = Utc::now().date_naive();
        if today < reservation.check_in_date {
            return Err(CoreError::invalid_transition(
                "Reservation",
                &reservation.id,
                reservation.status,
                ReservationStatus::CheckedIn,
            )
            .into());
        }

        // Room selection: explicit room is verified, otherwise the first
        // available room of the requested type is taken.
        let room = match &request.room_id {
            Some(room_id) => {
                let room = RoomRepository::get_by_id_in(&mut *tx, room_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Room", room_id))?;
                if !room.status.is_bookable() {
                    return Err(CoreError::invalid_transition(
                        "Room",
                        &room.id,
                        room.status,
                        RoomStatus::Occupied,
                    )
                    .into());
                }
                let conflict = ReservationRepository::overlap_exists_in(
                    &mut *tx,
                    &room.id,
                    reservation.check_in_date,
                    reservation.check_out_date,
                    &reservation.id,
                )
                .await?;
                if conflict {
                    return Err(CoreError::NoRoomAvailable {
                        property_id: property_id.clone(),
                        room_type_id: reservation.room_type_id.clone(),
                    }
                    .into());
                }
                room
            }
            None => {
                let candidates = RoomRepository::find_available_in(
                    &mut *tx,
                    &property_id,
                    &reservation.room_type_id,
                    reservation.check_in_date,
                    reservation.check_out_date,
                )
                .await?;
                candidates
                    .into_iter()
                    .next()
                    .ok_or_else(|| CoreError::NoRoomAvailable {
                        property_id: property_id.clone(),
                        room_type_id: reservation.room_type_id.clone(),
                    })?
            }
        };

        if request.number_of_guests < 1 {
            return Err(CoreError::Validation(
                innkeep_core::ValidationError::MustBePositive {
                    field: "number_of_guests".to_string(),
                },
            )
            .into());
        }

        let now = Utc::now();
        let record = CheckInRecord {
            id: new_id(),
            reservation_id: reservation.id.clone(),
            property_id: property_id.clone(),
            room_id: room.id.clone(),
            number_of_guests: request.number_of_guests,
            special_requests: request.special_requests.clone(),
            deposit_cents: request.deposit.cents(),
            status: CheckInStatus::CheckedIn,
            checked_in_at: now,
            checked_in_by: actor.id.clone(),
            checked_out_at: None,
            checked_out_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        CheckInRepository::insert_in(&mut *tx, &record).await?;

        let folio = create_stay_folio(
            &mut tx,
            self.db.pms_config(),
            &record,
            reservation.total_rate(),
            reservation.total_nights,
            actor,
        )
        .await?;

        RoomRepository::set_status_in(&mut *tx, &room.id, RoomStatus::Occupied).await?;
        ReservationRepository::assign_room_in(&mut *tx, &reservation.id, &room.id).await?;
        ReservationRepository::update_status_in(
            &mut *tx,
            &reservation.id,
            ReservationStatus::Confirmed,
            ReservationStatus::CheckedIn,
        )
        .await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "checkin_record",
                &record.id,
                "guest_checkin",
                json!({
                    "reservation_id": reservation.id,
                    "room_id": room.id,
                    "room_number": room.room_number,
                    "folio_number": folio.folio_number,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(
            record_id = %record.id,
            room_number = %room.room_number,
            folio_number = %folio.folio_number,
            "guest checked in"
        );
        Ok((record, folio))
    }

    /// Checks out a stay: optional inline settlement payment, balance
    /// check, folio sealing, room to Dirty.
    pub async fn check_out(
        &self,
        request: CheckOutRequest,
        actor: &Actor,
    ) -> ServiceResult<(CheckInRecord, Folio)> {
        actor.require(Scope::FrontDesk)?;

        let mut tx = self.db.pool().begin().await?;

        let record = CheckInRepository::get_by_id_in(&mut *tx, &request.checkin_record_id)
            .await?
            .ok_or_else(|| CoreError::not_found("CheckInRecord", &request.checkin_record_id))?;

        if record.status != CheckInStatus::CheckedIn {
            return Err(CoreError::invalid_transition(
                "CheckInRecord",
                &record.id,
                record.status,
                CheckInStatus::CheckedOut,
            )
            .into());
        }

        let reservation = ReservationRepository::get_by_id_in(&mut *tx, &record.reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", &record.reservation_id))?;

        let mut folio = FolioRepository::get_by_checkin_in(&mut *tx, &record.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Folio", &record.id))?;
        folio.ensure_open()?;

        if let Some(payment) = &request.payment {
            let row = Payment {
                id: new_id(),
                folio_id: Some(folio.id.clone()),
                order_id: None,
                method: payment.method,
                amount_cents: payment.amount.cents(),
                reference: payment.reference.clone(),
                received_by: actor.id.clone(),
                deleted_at: None,
                created_at: Utc::now(),
            };
            FolioRepository::insert_payment_in(&mut *tx, &row).await?;
            folio::apply_payment(&mut folio, payment.amount);
            FolioRepository::update_totals_in(&mut *tx, &folio).await?;
            ActivityLogRepository::append_in(
                &mut *tx,
                &ActivityEvent::new(
                    "folio",
                    &folio.id,
                    "payment_posted",
                    json!({
                        "method": payment.method,
                        "amount_cents": payment.amount.cents(),
                        "balance_cents": folio.balance_cents,
                    }),
                    &actor.id,
                ),
            )
            .await?;
        }

        if request.settle_folio && folio.balance().is_positive() {
            return Err(CoreError::BalanceNotZero {
                folio_id: folio.id.clone(),
                balance: folio.balance(),
            }
            .into());
        }

        let now = Utc::now();
        let departed_status = if now.date_naive() < reservation.check_out_date {
            CheckInStatus::EarlyDeparture
        } else {
            CheckInStatus::CheckedOut
        };

        CheckInRepository::mark_checked_out_in(&mut *tx, &record.id, departed_status, now, &actor.id)
            .await?;
        ReservationRepository::update_status_in(
            &mut *tx,
            &reservation.id,
            ReservationStatus::CheckedIn,
            ReservationStatus::CheckedOut,
        )
        .await?;
        RoomRepository::set_status_in(&mut *tx, &record.room_id, RoomStatus::Dirty).await?;

        if request.settle_folio {
            FolioRepository::seal_in(&mut *tx, &folio.id, now)
                .await
                .map_err(|e| match e {
                    DbError::NotFound { .. } => CoreError::FolioSealed {
                        folio_id: folio.id.clone(),
                    }
                    .into(),
                    other => crate::error::ServiceError::Db(other),
                })?;
            folio.is_settled = true;
            folio.settled_at = Some(now);
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "checkin_record",
                &record.id,
                "guest_checkout",
                json!({
                    "status": departed_status,
                    "settled": request.settle_folio,
                    "balance_cents": folio.balance_cents,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(record_id = %record.id, status = %departed_status, "guest checked out");

        let mut departed = record;
        departed.status = departed_status;
        departed.checked_out_at = Some(now);
        departed.checked_out_by = Some(actor.id.clone());
        Ok((departed, folio))
    }

    /// Walk-in: guest upsert (by email), reservation created directly
    /// CheckedIn, room assignment, stay record, and folio in one atomic
    /// step under the property lock.
    pub async fn walk_in(
        &self,
        request: WalkInRequest,
        actor: &Actor,
    ) -> ServiceResult<(Reservation, CheckInRecord, Folio)> {
        actor.require(Scope::FrontDesk)?;

        validate_name("guest_name", &request.guest_name).map_err(CoreError::from)?;
        validate_email(&request.guest_email).map_err(CoreError::from)?;
        validate_guest_counts(request.adults, request.children).map_err(CoreError::from)?;
        if request.nights < 1 {
            return Err(CoreError::Validation(
                innkeep_core::ValidationError::MustBePositive {
                    field: "nights".to_string(),
                },
            )
            .into());
        }

        let locks = self.db.locks();
        let _property_guard = locks.property(&request.property_id).await;

        let mut tx = self.db.pool().begin().await?;

        let guest = GuestRepository::upsert_by_email_in(
            &mut *tx,
            &request.guest_name,
            &request.guest_email,
            request.guest_phone.as_deref(),
        )
        .await?;

        let today = Utc::now().date_naive();
        let check_out_date = today + chrono::Duration::days(request.nights);

        let candidates = RoomRepository::find_available_in(
            &mut *tx,
            &request.property_id,
            &request.room_type_id,
            today,
            check_out_date,
        )
        .await?;
        let room = candidates
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NoRoomAvailable {
                property_id: request.property_id.clone(),
                room_type_id: request.room_type_id.clone(),
            })?;

        let rate = request.nightly_rate.unwrap_or_else(|| room.base_price());
        let now = Utc::now();

        let reservation = Reservation {
            id: new_id(),
            property_id: request.property_id.clone(),
            guest_id: guest.id.clone(),
            room_type_id: request.room_type_id.clone(),
            room_id: Some(room.id.clone()),
            check_in_date: today,
            check_out_date,
            adults: request.adults,
            children: request.children,
            nightly_rate_cents: rate.cents(),
            total_nights: request.nights,
            status: ReservationStatus::CheckedIn,
            source: BookingSource::WalkIn,
            notes: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        ReservationRepository::insert_in(&mut *tx, &reservation).await?;

        let record = CheckInRecord {
            id: new_id(),
            reservation_id: reservation.id.clone(),
            property_id: request.property_id.clone(),
            room_id: room.id.clone(),
            number_of_guests: request.number_of_guests,
            special_requests: request.special_requests.clone(),
            deposit_cents: request.deposit.cents(),
            status: CheckInStatus::CheckedIn,
            checked_in_at: now,
            checked_in_by: actor.id.clone(),
            checked_out_at: None,
            checked_out_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        CheckInRepository::insert_in(&mut *tx, &record).await?;

        let folio = create_stay_folio(
            &mut tx,
            self.db.pms_config(),
            &record,
            reservation.total_rate(),
            reservation.total_nights,
            actor,
        )
        .await?;

        RoomRepository::set_status_in(&mut *tx, &room.id, RoomStatus::Occupied).await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "checkin_record",
                &record.id,
                "walk_in_checkin",
                json!({
                    "guest_id": guest.id,
                    "room_number": room.room_number,
                    "folio_number": folio.folio_number,
                    "nights": request.nights,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(
            record_id = %record.id,
            guest_id = %guest.id,
            room_number = %room.room_number,
            "walk-in checked in"
        );
        Ok((reservation, record, folio))
    }
}

/// Creates the stay folio inside the caller's transaction: header, the
/// opening room-charge line (`rate × nights`), and the recomputed totals.
/// A folio-number collision is retried once with a fresh suffix.
async fn create_stay_folio(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    config: &PmsConfig,
    record: &CheckInRecord,
    room_charge_total: Money,
    nights: i64,
    actor: &Actor,
) -> ServiceResult<Folio> {
    let now = Utc::now();
    let today = now.date_naive();

    let mut stay_folio = Folio {
        id: new_id(),
        checkin_record_id: record.id.clone(),
        folio_number: folio_number(&config.folio_number_prefix, today, &record.id),
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
    };

    let room_charge = FolioCharge {
        id: new_id(),
        folio_id: stay_folio.id.clone(),
        kind: ChargeKind::Room,
        description: format!("Room charge x {nights} nights"),
        amount_cents: room_charge_total.cents(),
        quantity_hundredths: Quantity::from_units(nights).hundredths(),
        tax_inclusive: false,
        posted_by: actor.id.clone(),
        deleted_at: None,
        created_at: now,
    };

    let charges = vec![room_charge.clone()];
    folio::recompute(&mut stay_folio, &charges, config.tax_rate);
    debug_assert!(folio::invariants_hold(&stay_folio, &charges));

    // One retry with a regenerated number on a UNIQUE collision.
    if let Err(err) = FolioRepository::insert_in(&mut *tx, &stay_folio).await {
        if err.is_unique_violation_on("folio_number") {
            stay_folio.folio_number =
                folio_number(&config.folio_number_prefix, today, &new_id());
            FolioRepository::insert_in(&mut *tx, &stay_folio).await?;
        } else {
            return Err(err.into());
        }
    }
    FolioRepository::insert_charge_in(&mut *tx, &room_charge).await?;

    Ok(stay_folio)
}
