#![allow(dead_code)]

//! Shared fixtures for the integration tests: an in-memory database with
//! a seeded property (room type + rooms), a guest, and actors per role.

use chrono::{Duration, Utc};
use innkeep_core::catalog::{MenuItem, PosCategory, Property, RoomType};
use innkeep_core::guest::Guest;
use innkeep_core::inventory::InventoryItem;
use innkeep_core::money::{Money, Quantity};
use innkeep_core::reservation::{BookingSource, Reservation};
use innkeep_core::room::Room;
use innkeep_core::{Actor, Role};
use innkeep_db::{Database, DbConfig, NewInventoryItem, NewReservation};

/// A seeded property with rooms, a guest, and a POS/inventory catalog.
pub struct Fixture {
    pub db: Database,
    pub property: Property,
    pub room_type: RoomType,
    pub rooms: Vec<Room>,
    pub guest: Guest,
    pub pos_category: PosCategory,
}

/// Fresh in-memory database with migrations applied.
pub async fn database() -> Database {
    // RUST_LOG=debug surfaces repository/service tracing in test output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Seeds a property with `room_count` Standard rooms at $80.00/night and
/// one registered guest.
pub async fn fixture(room_count: usize) -> Fixture {
    let db = database().await;
    let catalog = db.catalog();

    let property = catalog
        .create_property("Harborview Hotel", Some("1 Quay Street"))
        .await
        .unwrap();
    let room_type = catalog
        .create_room_type(
            &property.id,
            "STD",
            "Standard Queen",
            Money::from_cents(8000),
            2,
            2,
            None,
        )
        .await
        .unwrap();

    let mut rooms = Vec::new();
    for n in 0..room_count {
        let room = db
            .rooms()
            .create(
                &property.id,
                &format!("{}", 101 + n),
                &room_type.id,
                Money::from_cents(8000),
                None,
            )
            .await
            .unwrap();
        rooms.push(room);
    }

    let guest = db
        .guests()
        .create("Ada Harper", "ada.harper@example.com", Some("+1-555-0101"))
        .await
        .unwrap();

    let pos_category = catalog.create_pos_category("Kitchen").await.unwrap();

    Fixture {
        db,
        property,
        room_type,
        rooms,
        guest,
        pos_category,
    }
}

pub fn staff() -> Actor {
    Actor::new("staff-1", Role::Staff)
}

pub fn owner() -> Actor {
    Actor::new("owner-1", Role::Owner)
}

pub fn accountant() -> Actor {
    Actor::new("accountant-1", Role::Accountant)
}

pub fn housekeeper() -> Actor {
    Actor::new("hk-1", Role::Housekeeping)
}

impl Fixture {
    /// A Confirmed reservation starting today for the seeded guest.
    pub async fn confirmed_reservation(&self, rate_cents: i64, nights: i64) -> Reservation {
        self.confirmed_reservation_for(&self.guest.id, rate_cents, nights, 0)
            .await
    }

    /// A Confirmed reservation starting `offset_days` from today.
    pub async fn confirmed_reservation_for(
        &self,
        guest_id: &str,
        rate_cents: i64,
        nights: i64,
        offset_days: i64,
    ) -> Reservation {
        let check_in = Utc::now().date_naive() + Duration::days(offset_days);
        self.db
            .booking()
            .create(
                NewReservation {
                    property_id: self.property.id.clone(),
                    guest_id: guest_id.to_string(),
                    room_type_id: self.room_type.id.clone(),
                    check_in_date: check_in,
                    check_out_date: check_in + Duration::days(nights),
                    adults: 2,
                    children: 0,
                    nightly_rate: Money::from_cents(rate_cents),
                    source: BookingSource::Direct,
                    confirmed: true,
                    notes: None,
                },
                &staff(),
            )
            .await
            .unwrap()
    }

    /// An inventory item with an opening stock booked through an In
    /// movement (conservation holds from row one).
    pub async fn stocked_item(&self, sku: &str, opening_units: i64) -> InventoryItem {
        let item = self
            .db
            .inventory()
            .create_item(NewInventoryItem {
                property_id: self.property.id.clone(),
                sku: sku.to_string(),
                name: format!("{sku} (test)"),
                category_id: None,
                unit_of_measure: "piece".to_string(),
                cost_price: Money::from_cents(250),
                selling_price: Money::from_cents(600),
                min_stock: Quantity::from_units(1),
                max_stock: Quantity::from_units(100),
                reorder_level: Quantity::from_units(2),
                is_perishable: false,
                shelf_life_days: None,
            })
            .await
            .unwrap();

        if opening_units > 0 {
            self.db
                .stock()
                .append_movement(
                    innkeep_db::NewMovement {
                        item_id: item.id.clone(),
                        kind: innkeep_core::inventory::MovementKind::In,
                        quantity: Quantity::from_units(opening_units),
                        unit_cost: None,
                        reference: Some("OPENING".to_string()),
                        notes: None,
                    },
                    &owner(),
                )
                .await
                .unwrap();
        }

        self.db.inventory().get_item(&item.id).await.unwrap().unwrap()
    }

    /// A menu item, optionally depleting one unit of `inventory_item` per
    /// unit sold.
    pub async fn menu_item(
        &self,
        name: &str,
        price_cents: i64,
        inventory_item: Option<&str>,
    ) -> MenuItem {
        self.db
            .catalog()
            .create_menu_item(
                &self.pos_category.id,
                name,
                Money::from_cents(price_cents),
                inventory_item.map(|id| (id, Quantity::from_units(1))),
            )
            .await
            .unwrap()
    }

    /// Asserts the folio ledger invariants against the stored rows.
    pub async fn assert_folio_invariants(&self, folio_id: &str) {
        let folio = self
            .db
            .folios()
            .get_with_deleted(folio_id)
            .await
            .unwrap()
            .expect("folio exists");
        let charges = self.db.folios().charges(folio_id).await.unwrap();
        let payments = self.db.folios().payments_for_folio(folio_id).await.unwrap();

        let incidental: i64 = charges
            .iter()
            .filter(|c| !c.kind.is_room())
            .map(|c| c.amount_cents)
            .sum();
        let paid: i64 = payments.iter().map(|p| p.amount_cents).sum();

        assert_eq!(
            folio.total_charges_cents,
            folio.room_charges_cents + folio.incidental_charges_cents + folio.tax_amount_cents,
            "total must equal room + incidental + tax for folio {folio_id}"
        );
        assert_eq!(
            folio.balance_cents,
            folio.total_charges_cents - folio.payments_received_cents,
            "balance must equal total - payments for folio {folio_id}"
        );
        assert_eq!(
            folio.incidental_charges_cents, incidental,
            "incidental must equal the sum of non-room charges for folio {folio_id}"
        );
        assert_eq!(
            folio.payments_received_cents, paid,
            "payments column drifted from payment rows for folio {folio_id}"
        );
    }

    /// Asserts stock conservation: on-hand equals the signed sum of the
    /// item's full movement ledger.
    pub async fn assert_stock_conservation(&self, item_id: &str) {
        let item = self
            .db
            .inventory()
            .get_item(item_id)
            .await
            .unwrap()
            .expect("item exists");
        let ledger_sum = self.db.inventory().sum_signed_deltas(item_id).await.unwrap();
        assert_eq!(
            item.on_hand_hundredths, ledger_sum,
            "conservation violated for item {item_id}"
        );
    }
}
