//! Night audit: day counters, no-show sweep, idempotence, authorization.

mod common;

use chrono::Utc;
use innkeep_core::money::Money;
use innkeep_core::reservation::ReservationStatus;
use innkeep_core::CoreError;
use innkeep_db::{CheckInRequest, CheckOutRequest};

use common::{accountant, fixture, housekeeper, staff};

/// A day with 4 arrivals, 3 departures, 1 no-show; run twice, identical record.
#[tokio::test]
async fn counters_and_idempotence() {
    let fx = fixture(5).await;
    let today = Utc::now().date_naive();

    // four stays checked in today, three of them departing today
    let mut records = Vec::new();
    for i in 0..4 {
        let guest = fx
            .db
            .guests()
            .create(&format!("Guest {i}"), &format!("guest{i}@example.com"), None)
            .await
            .unwrap();
        let reservation = fx
            .confirmed_reservation_for(&guest.id, 10_000, 1, 0)
            .await;
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
        records.push((record, folio));
    }
    for (record, folio) in records.iter().take(3) {
        fx.db
            .folio_service()
            .post_payment(
                &folio.id,
                innkeep_core::payment::PaymentMethod::Card,
                Money::from_cents(folio.balance_cents),
                None,
                &staff(),
            )
            .await
            .unwrap();
        fx.db
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
    }

    // one same-day no-show, phoned in
    let no_show = fx.confirmed_reservation(10_000, 1).await;
    fx.db.booking().no_show(&no_show.id, &staff()).await.unwrap();

    // one stale Confirmed arrival from two days ago, swept by the audit
    let stale = fx
        .confirmed_reservation_for(&fx.guest.id, 10_000, 1, -2)
        .await;

    let first = fx
        .db
        .night_audit()
        .run(&fx.property.id, today, &accountant())
        .await
        .unwrap();

    assert!(first.is_completed);
    assert_eq!(first.arrivals, 4);
    assert_eq!(first.departures, 3);
    assert_eq!(first.no_shows, 1);
    assert_eq!(first.occupied_rooms, 1);
    // revenue: four folios created today at 100.00 + 10% tax each
    assert_eq!(first.revenue_cents, 4 * 11_000);

    let swept = fx.db.reservations().get_by_id(&stale.id).await.unwrap().unwrap();
    assert_eq!(swept.status, ReservationStatus::NoShow);

    // run ∘ run = run
    let second = fx
        .db
        .night_audit()
        .run(&fx.property.id, today, &accountant())
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.counters(), first.counters());
    assert!(second.is_completed);
}

#[tokio::test]
async fn audit_requires_audit_scope() {
    let fx = fixture(1).await;
    let today = Utc::now().date_naive();

    let err = fx
        .db
        .night_audit()
        .run(&fx.property.id, today, &housekeeper())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::AuthorizationDenied { .. })
    ));

    // accountants and owners may close the day
    fx.db
        .night_audit()
        .run(&fx.property.id, today, &accountant())
        .await
        .unwrap();
}

#[tokio::test]
async fn audits_are_per_property_and_date() {
    let fx = fixture(1).await;
    let today = Utc::now().date_naive();
    let yesterday = today - chrono::Duration::days(1);

    let a = fx
        .db
        .night_audit()
        .run(&fx.property.id, yesterday, &accountant())
        .await
        .unwrap();
    let b = fx
        .db
        .night_audit()
        .run(&fx.property.id, today, &accountant())
        .await
        .unwrap();
    assert_ne!(a.id, b.id);

    let history = fx.db.audits().list_for_property(&fx.property.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].business_date, today);
}
