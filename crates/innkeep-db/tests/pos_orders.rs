//! POS orders: totals, the kitchen state machine, room-charge settlement
//! onto a folio, and cancellation reversing inventory.

mod common;

use innkeep_core::money::{Money, Quantity};
use innkeep_core::payment::PaymentMethod;
use innkeep_core::pos::{OrderPaymentStatus, OrderStatus, OrderType};
use innkeep_core::CoreError;
use innkeep_db::{CheckInRequest, NewOrder, NewOrderLine};

use common::{fixture, staff, Fixture};

/// A checked-in stay whose folio has been paid down to balance zero.
async fn zero_balance_folio(fx: &Fixture) -> String {
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
    fx.db
        .folio_service()
        .post_payment(&folio.id, PaymentMethod::Card, folio.balance(), None, &staff())
        .await
        .unwrap();
    folio.id
}

/// One line (qty 2 × $12.00): subtotal 24.00, tax 2.40, service
/// 1.20, total 27.60; room charge moves the folio by exactly 27.60 as a
/// single food charge, with no payment row against the order.
#[tokio::test]
async fn room_charge_order_flows_to_folio() {
    let fx = fixture(1).await;
    let folio_id = zero_balance_folio(&fx).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, lines) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::RoomService,
                guest_id: Some(fx.guest.id.clone()),
                folio_id: Some(folio_id.clone()),
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id.clone(),
                    quantity: Quantity::from_units(2),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_total_cents, 2_400);
    assert_eq!(order.subtotal_cents, 2_400);
    assert_eq!(order.tax_cents, 240);
    assert_eq!(order.service_charge_cents, 120);
    assert_eq!(order.total_cents, 2_760);

    let before = fx.db.folios().get_by_id(&folio_id).await.unwrap().unwrap();
    assert_eq!(before.balance_cents, 0);

    let order = fx
        .db
        .pos()
        .pay(
            &order.id,
            PaymentMethod::RoomCharge,
            Money::from_cents(2_760),
            None,
            &staff(),
        )
        .await
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::ChargedToRoom);

    let after = fx.db.folios().get_by_id(&folio_id).await.unwrap().unwrap();
    assert_eq!(after.incidental_charges_cents - before.incidental_charges_cents, 2_760);
    assert_eq!(after.total_charges_cents - before.total_charges_cents, 2_760);
    assert_eq!(after.balance_cents, 2_760);
    fx.assert_folio_invariants(&folio_id).await;

    // exactly one food charge of the order total, zero payment rows
    let charges = fx.db.folios().charges(&folio_id).await.unwrap();
    let food: Vec<_> = charges
        .iter()
        .filter(|c| c.amount_cents == 2_760 && c.tax_inclusive)
        .collect();
    assert_eq!(food.len(), 1);
    let order_payments = fx.db.folios().payments_for_order(&order.id).await.unwrap();
    assert!(order_payments.is_empty());
}

#[tokio::test]
async fn room_charge_requires_folio_link() {
    let fx = fixture(1).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::DineIn,
                guest_id: None,
                folio_id: None,
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id,
                    quantity: Quantity::from_units(1),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    let err = fx
        .db
        .pos()
        .pay(&order.id, PaymentMethod::RoomCharge, order.total(), None, &staff())
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
}

#[tokio::test]
async fn cash_payment_marks_paid_with_payment_row() {
    let fx = fixture(1).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::Takeaway,
                guest_id: None,
                folio_id: None,
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id,
                    quantity: Quantity::from_units(1),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    let order = fx
        .db
        .pos()
        .pay(&order.id, PaymentMethod::Cash, order.total(), None, &staff())
        .await
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Paid);

    let payments = fx.db.folios().payments_for_order(&order.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount_cents, order.total_cents);
}

#[tokio::test]
async fn order_status_machine_enforced() {
    let fx = fixture(1).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::DineIn,
                guest_id: None,
                folio_id: None,
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id,
                    quantity: Quantity::from_units(1),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    // no skipping Pending -> Ready
    let err = fx
        .db
        .pos()
        .advance(&order.id, OrderStatus::Ready, &staff())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
    ] {
        fx.db.pos().advance(&order.id, status, &staff()).await.unwrap();
    }

    // served orders cannot be cancelled
    let err = fx.db.pos().cancel(&order.id, &staff()).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

/// Confirmation depletes linked stock; cancellation returns it, and a
/// second cancellation is a no-op.
#[tokio::test]
async fn cancellation_reverses_inventory_idempotently() {
    let fx = fixture(1).await;
    let beans = fx.stocked_item("COFFEE-BAG", 10).await;
    let espresso = fx.menu_item("Espresso", 450, Some(&beans.id)).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::DineIn,
                guest_id: None,
                folio_id: None,
                lines: vec![NewOrderLine {
                    menu_item_id: espresso.id,
                    quantity: Quantity::from_units(3),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    fx.db
        .pos()
        .advance(&order.id, OrderStatus::Confirmed, &staff())
        .await
        .unwrap();

    let item = fx.db.inventory().get_item(&beans.id).await.unwrap().unwrap();
    assert_eq!(item.on_hand_hundredths, 700); // 10 - 3
    fx.assert_stock_conservation(&beans.id).await;

    let cancelled = fx.db.pos().cancel(&order.id, &staff()).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let item = fx.db.inventory().get_item(&beans.id).await.unwrap().unwrap();
    assert_eq!(item.on_hand_hundredths, 1_000); // restored
    fx.assert_stock_conservation(&beans.id).await;

    // idempotent: a second cancel changes nothing
    let again = fx.db.pos().cancel(&order.id, &staff()).await.unwrap();
    assert_eq!(again.status, OrderStatus::Cancelled);
    let item = fx.db.inventory().get_item(&beans.id).await.unwrap().unwrap();
    assert_eq!(item.on_hand_hundredths, 1_000);
    fx.assert_stock_conservation(&beans.id).await;

    let movements = fx.db.inventory().movements_for(&beans.id).await.unwrap();
    // opening In + order Out + cancellation Return
    assert_eq!(movements.len(), 3);
}

#[tokio::test]
async fn discount_reduces_total() {
    let fx = fixture(1).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::DineIn,
                guest_id: None,
                folio_id: None,
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id,
                    quantity: Quantity::from_units(2),
                }],
                discount: Money::from_cents(400),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    // 24.00 + 2.40 + 1.20 - 4.00
    assert_eq!(order.total_cents, 2_360);
    assert_eq!(
        order.total_cents,
        order.subtotal_cents + order.tax_cents + order.service_charge_cents
            - order.discount_cents
    );
}

#[tokio::test]
async fn paying_twice_is_rejected() {
    let fx = fixture(1).await;
    let folio_id = zero_balance_folio(&fx).await;
    let sandwich = fx.menu_item("Club Sandwich", 1_200, None).await;

    let (order, _) = fx
        .db
        .pos()
        .create_order(
            NewOrder {
                property_id: fx.property.id.clone(),
                order_type: OrderType::RoomService,
                guest_id: None,
                folio_id: Some(folio_id),
                lines: vec![NewOrderLine {
                    menu_item_id: sandwich.id,
                    quantity: Quantity::from_units(1),
                }],
                discount: Money::zero(),
                notes: None,
            },
            &staff(),
        )
        .await
        .unwrap();

    fx.db
        .pos()
        .pay(&order.id, PaymentMethod::RoomCharge, order.total(), None, &staff())
        .await
        .unwrap();

    let err = fx
        .db
        .pos()
        .pay(&order.id, PaymentMethod::Cash, order.total(), None, &staff())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}
