//! Stay lifecycle: reservation → check-in → folio → payments → check-out,
//! plus walk-ins and the sealed-folio guard.

mod common;

use innkeep_core::checkin::CheckInStatus;
use innkeep_core::folio::ChargeKind;
use innkeep_core::money::{Money, Quantity};
use innkeep_core::payment::PaymentMethod;
use innkeep_core::reservation::ReservationStatus;
use innkeep_core::room::RoomStatus;
use innkeep_core::CoreError;
use innkeep_db::{CheckInRequest, CheckOutRequest, SettlementPayment, WalkInRequest};

use common::{fixture, staff};

/// Happy-path stay: rate 100.00 × 2 nights, 10% tax, card payment,
/// settled check-out.
#[tokio::test]
async fn happy_path_stay() {
    let fx = fixture(2).await;
    let reservation = fx.confirmed_reservation(10_000, 2).await;

    let (record, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id.clone(),
                room_id: None,
                number_of_guests: 2,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(folio.room_charges_cents, 20_000);
    assert_eq!(folio.tax_amount_cents, 2_000);
    assert_eq!(folio.total_charges_cents, 22_000);
    assert_eq!(folio.balance_cents, 22_000);
    fx.assert_folio_invariants(&folio.id).await;

    // auto-assignment takes the lowest room number
    let room = fx.db.rooms().get_by_id(&record.room_id).await.unwrap().unwrap();
    assert_eq!(room.room_number, "101");
    assert_eq!(room.status, RoomStatus::Occupied);

    let reservation = fx
        .db
        .reservations()
        .get_by_id(&reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::CheckedIn);
    assert_eq!(reservation.room_id.as_deref(), Some(record.room_id.as_str()));

    let folio = fx
        .db
        .folio_service()
        .post_payment(&folio.id, PaymentMethod::Card, Money::from_cents(22_000), None, &staff())
        .await
        .unwrap();
    assert_eq!(folio.balance_cents, 0);
    fx.assert_folio_invariants(&folio.id).await;

    let (record, folio) = fx
        .db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id.clone(),
                settle_folio: true,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    assert!(record.status.is_departed());
    assert!(folio.is_settled);
    assert!(folio.settled_at.is_some());

    let reservation = fx
        .db
        .reservations()
        .get_by_id(&reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::CheckedOut);

    let room = fx.db.rooms().get_by_id(&record.room_id).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Dirty);
}

#[tokio::test]
async fn check_in_requires_confirmed_reservation() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(10_000, 1).await;
    fx.db.booking().cancel(&reservation.id, &staff()).await.unwrap();

    let err = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id.clone(),
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn booking_dag_rejects_backward_moves() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(10_000, 1).await;

    // Confirmed -> Confirmed is not a move
    let err = fx.db.booking().confirm(&reservation.id, &staff()).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));

    // cancelled is terminal
    fx.db.booking().cancel(&reservation.id, &staff()).await.unwrap();
    let err = fx.db.booking().confirm(&reservation.id, &staff()).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

/// Round trip: charge X then pay X returns the balance to zero and
/// leaves exactly one charge row and one payment row behind.
#[tokio::test]
async fn charge_then_payment_round_trip() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (_, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    let before = fx.db.folios().get_by_id(&folio.id).await.unwrap().unwrap();

    let after_charge = fx
        .db
        .folio_service()
        .post_charge(
            &folio.id,
            ChargeKind::Minibar,
            "Minibar restock",
            Money::from_cents(1_500),
            Quantity::from_units(1),
            &staff(),
        )
        .await
        .unwrap();
    // minibar charge is taxable: total moves by amount + tax on it
    assert_eq!(after_charge.incidental_charges_cents, 1_500);
    fx.assert_folio_invariants(&folio.id).await;

    let delta = after_charge.balance_cents - before.balance_cents;
    let after_payment = fx
        .db
        .folio_service()
        .post_payment(
            &folio.id,
            PaymentMethod::Cash,
            Money::from_cents(after_charge.balance_cents),
            None,
            &staff(),
        )
        .await
        .unwrap();
    assert_eq!(after_payment.balance_cents, 0);
    assert!(delta > 0);

    let charges = fx.db.folios().charges(&folio.id).await.unwrap();
    let payments = fx.db.folios().payments_for_folio(&folio.id).await.unwrap();
    // room charge + minibar charge; one payment
    assert_eq!(charges.len(), 2);
    assert_eq!(payments.len(), 1);
    fx.assert_folio_invariants(&folio.id).await;
}

#[tokio::test]
async fn overpayment_is_carried_as_credit() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (_, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    let paid = folio.total_charges_cents + 2_500;
    let folio = fx
        .db
        .folio_service()
        .post_payment(&folio.id, PaymentMethod::Cash, Money::from_cents(paid), None, &staff())
        .await
        .unwrap();

    assert_eq!(folio.balance_cents, -2_500);
    fx.assert_folio_invariants(&folio.id).await;
}

#[tokio::test]
async fn settlement_with_outstanding_balance_fails() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (record, _) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    let err = fx
        .db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id.clone(),
                settle_folio: true,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::BalanceNotZero { .. })
    ));

    // the failed settlement left the stay intact
    let record = fx.db.checkins().get_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(record.status, CheckInStatus::CheckedIn);
}

#[tokio::test]
async fn settlement_with_inline_payment_succeeds() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (record, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    let (record, folio) = fx
        .db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id,
                settle_folio: true,
                payment: Some(SettlementPayment {
                    method: PaymentMethod::Card,
                    amount: folio.balance(),
                    reference: Some("AUTH-4921".to_string()),
                }),
            },
            &staff(),
        )
        .await
        .unwrap();

    assert!(record.status.is_departed());
    assert!(folio.is_settled);
    assert_eq!(folio.balance_cents, 0);
    fx.assert_folio_invariants(&folio.id).await;
}

/// Once sealed, neither charges nor payments may be appended.
#[tokio::test]
async fn sealed_folio_rejects_mutations() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (record, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    fx.db
        .folio_service()
        .post_payment(&folio.id, PaymentMethod::Cash, folio.balance(), None, &staff())
        .await
        .unwrap();
    fx.db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id,
                settle_folio: true,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    let err = fx
        .db
        .folio_service()
        .post_charge(
            &folio.id,
            ChargeKind::Laundry,
            "Late laundry",
            Money::from_cents(900),
            Quantity::from_units(1),
            &staff(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::FolioSealed { .. })));

    let err = fx
        .db
        .folio_service()
        .post_payment(&folio.id, PaymentMethod::Cash, Money::from_cents(100), None, &staff())
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::FolioSealed { .. })));
}

#[tokio::test]
async fn walk_in_creates_guest_stay_and_folio() {
    let fx = fixture(2).await;

    let (reservation, record, folio) = fx
        .db
        .front_desk()
        .walk_in(
            WalkInRequest {
                property_id: fx.property.id.clone(),
                guest_name: "Noor Siddiqui".to_string(),
                guest_email: "noor@example.com".to_string(),
                guest_phone: None,
                room_type_id: fx.room_type.id.clone(),
                nights: 2,
                adults: 1,
                children: 0,
                nightly_rate: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::from_cents(5_000),
            },
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::CheckedIn);
    assert_eq!(record.status, CheckInStatus::CheckedIn);
    // room base price 80.00 × 2 nights + 10% tax
    assert_eq!(folio.room_charges_cents, 16_000);
    assert_eq!(folio.total_charges_cents, 17_600);
    fx.assert_folio_invariants(&folio.id).await;

    let room = fx.db.rooms().get_by_id(&record.room_id).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);

    let guest = fx.db.guests().find_by_email("noor@example.com").await.unwrap();
    assert!(guest.is_some());

    // a second walk-in with the same email reuses the guest row
    let (_, record2, _) = fx
        .db
        .front_desk()
        .walk_in(
            WalkInRequest {
                property_id: fx.property.id.clone(),
                guest_name: "Noor Siddiqui".to_string(),
                guest_email: "noor@example.com".to_string(),
                guest_phone: Some("+1-555-0202".to_string()),
                room_type_id: fx.room_type.id.clone(),
                nights: 1,
                adults: 1,
                children: 0,
                nightly_rate: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();
    assert_ne!(record.room_id, record2.room_id);

    let reservations = fx
        .db
        .reservations()
        .list_by_property(&fx.property.id, None)
        .await
        .unwrap();
    let distinct_guests: std::collections::HashSet<_> =
        reservations.iter().map(|r| r.guest_id.clone()).collect();
    assert_eq!(distinct_guests.len(), 1);
}

/// Departing before the reservation's check-out date records an early
/// departure; it still counts as a departed stay.
#[tokio::test]
async fn early_departure_status() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 3).await;
    let (record, _) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    let (record, _) = fx
        .db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id,
                settle_folio: false,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, CheckInStatus::EarlyDeparture);
    assert!(record.status.is_departed());
}

#[tokio::test]
async fn double_check_out_rejected() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    let (record, _) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();

    fx.db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id.clone(),
                settle_folio: false,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    let err = fx
        .db
        .front_desk()
        .check_out(
            CheckOutRequest {
                checkin_record_id: record.id,
                settle_folio: false,
                payment: None,
            },
            &staff(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn pending_reservation_confirms_then_checks_in() {
    let fx = fixture(1).await;
    let check_in = chrono::Utc::now().date_naive();
    let reservation = fx
        .db
        .booking()
        .create(
            innkeep_db::NewReservation {
                property_id: fx.property.id.clone(),
                guest_id: fx.guest.id.clone(),
                room_type_id: fx.room_type.id.clone(),
                check_in_date: check_in,
                check_out_date: check_in + chrono::Duration::days(1),
                adults: 1,
                children: 0,
                nightly_rate: Money::from_cents(8_000),
                source: innkeep_core::reservation::BookingSource::Phone,
                confirmed: false,
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);

    // pending bookings cannot check in
    let err = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id.clone(),
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));

    let confirmed = fx.db.booking().confirm(&reservation.id, &staff()).await.unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    fx.db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();
}

/// Tax recomputation replaces the tax amount from the running bases and
/// re-derives totals and balance in the same pass.
#[tokio::test]
async fn tax_recompute_rederives_totals() {
    let fx = fixture(1).await;
    let reservation = fx.confirmed_reservation(10_000, 2).await;
    let (_, folio) = fx
        .db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();
    assert_eq!(folio.tax_amount_cents, 2_000);

    // tax-exempt stay: zero rate wipes the tax and shrinks the balance
    let folio = fx
        .db
        .folio_service()
        .tax_recompute(&folio.id, innkeep_core::money::Rate::zero(), &staff())
        .await
        .unwrap();
    assert_eq!(folio.tax_amount_cents, 0);
    assert_eq!(folio.total_charges_cents, 20_000);
    assert_eq!(folio.balance_cents, 20_000);
    fx.assert_folio_invariants(&folio.id).await;

    // and back at 8.25%: round((20000) * 0.0825) = 1650
    let folio = fx
        .db
        .folio_service()
        .tax_recompute(&folio.id, innkeep_core::money::Rate::from_bps(825), &staff())
        .await
        .unwrap();
    assert_eq!(folio.tax_amount_cents, 1_650);
    fx.assert_folio_invariants(&folio.id).await;
}

#[tokio::test]
async fn housekeeping_status_cycle() {
    let fx = fixture(1).await;
    let room = &fx.rooms[0];
    let hk = common::housekeeper();

    fx.db
        .housekeeping()
        .set_status(&room.id, RoomStatus::Dirty, Some("deep clean due"), &hk)
        .await
        .unwrap();
    fx.db
        .housekeeping()
        .set_status(&room.id, RoomStatus::Cleaning, None, &hk)
        .await
        .unwrap();
    let room_after = fx
        .db
        .housekeeping()
        .set_status(&room.id, RoomStatus::Available, None, &hk)
        .await
        .unwrap();
    assert_eq!(room_after.status, RoomStatus::Available);

    // housekeeping may not seat a guest
    let err = fx
        .db
        .housekeeping()
        .set_status(&room.id, RoomStatus::Occupied, None, &hk)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));

    // occupied rooms are off limits to housekeeping transitions
    let reservation = fx.confirmed_reservation(8_000, 1).await;
    fx.db
        .front_desk()
        .check_in(
            CheckInRequest {
                reservation_id: reservation.id,
                room_id: None,
                number_of_guests: 1,
                special_requests: None,
                deposit: Money::zero(),
            },
            &staff(),
        )
        .await
        .unwrap();
    let err = fx
        .db
        .housekeeping()
        .set_status(&room.id, RoomStatus::Cleaning, None, &hk)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}
