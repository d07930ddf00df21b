//! # POS Service
//!
//! Order creation with price snapshots, the kitchen status machine, the
//! inventory bridge (confirm depletes, cancel returns), and payment,
//! including room-charge settlement onto a guest folio.
//!
//! ## Room charge
//! ```text
//! pay(order, RoomCharge)
//!   order must be linked to an open folio
//!   ONE FolioCharge (kind food, amount = order.total, tax-inclusive)
//!   payment_status -> ChargedToRoom
//!   NO payment row against the order
//! ```

use chrono::Utc;
use serde_json::json;
use tracing::info;

use innkeep_core::catalog::MenuItem;
use innkeep_core::folio::{self, ChargeKind, FolioCharge};
use innkeep_core::inventory::MovementKind;
use innkeep_core::money::{Money, Quantity};
use innkeep_core::payment::{Payment, PaymentMethod};
use innkeep_core::pos::{
    calculate_totals, line_total, OrderPaymentStatus, OrderStatus, OrderType, PosOrder,
    PosOrderLine,
};
use innkeep_core::validation::validate_positive_quantity;
use innkeep_core::{Actor, ActivityEvent, CoreError, Scope, ValidationError};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::folio::FolioRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::new_id;
use crate::repository::pos::{generate_order_number, PosOrderRepository};
use crate::service::stock::apply_movement_in;

/// One requested order line.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_item_id: String,
    pub quantity: Quantity,
}

/// Parameters for opening a POS order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub property_id: String,
    pub order_type: OrderType,
    pub guest_id: Option<String>,
    /// Folio link, required before a room-charge payment.
    pub folio_id: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub discount: Money,
    pub notes: Option<String>,
}

/// POS order lifecycle operations.
#[derive(Debug, Clone)]
pub struct PosService {
    db: Database,
}

impl PosService {
    pub fn new(db: Database) -> Self {
        PosService { db }
    }

    /// Opens an order: snapshots menu prices into lines, computes totals
    /// from the configured tax and service rates.
    pub async fn create_order(
        &self,
        new: NewOrder,
        actor: &Actor,
    ) -> ServiceResult<(PosOrder, Vec<PosOrderLine>)> {
        actor.require(Scope::FrontDesk)?;

        if new.lines.is_empty() {
            return Err(CoreError::Validation(ValidationError::Required {
                field: "lines".to_string(),
            })
            .into());
        }
        for line in &new.lines {
            validate_positive_quantity("quantity", line.quantity).map_err(CoreError::from)?;
        }

        let mut tx = self.db.pool().begin().await?;

        let now = Utc::now();
        let order_id = new_id();
        let mut lines = Vec::with_capacity(new.lines.len());
        for requested in &new.lines {
            let item = CatalogRepository::get_menu_item_in(&mut *tx, &requested.menu_item_id)
                .await?
                .ok_or_else(|| CoreError::not_found("MenuItem", &requested.menu_item_id))?;

            lines.push(PosOrderLine {
                id: new_id(),
                order_id: order_id.clone(),
                menu_item_id: item.id.clone(),
                name_snapshot: item.name.clone(),
                unit_price_cents: item.price_cents,
                quantity_hundredths: requested.quantity.hundredths(),
                line_total_cents: line_total(item.price(), requested.quantity).cents(),
                created_at: now,
            });
        }

        let totals = calculate_totals(
            &lines.iter().map(PosOrderLine::line_total).collect::<Vec<_>>(),
            self.db.pms_config().tax_rate,
            self.db.pms_config().service_charge_rate,
            new.discount,
        );

        let mut order = PosOrder {
            id: order_id,
            order_number: generate_order_number(),
            property_id: new.property_id,
            order_type: new.order_type,
            guest_id: new.guest_id,
            folio_id: new.folio_id,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            service_charge_cents: totals.service_charge.cents(),
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Unpaid,
            notes: new.notes,
            created_by: actor.id.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        // One retry with a regenerated number on a UNIQUE collision.
        if let Err(err) = PosOrderRepository::insert_in(&mut *tx, &order).await {
            if err.is_unique_violation_on("order_number") {
                order.order_number = generate_order_number();
                PosOrderRepository::insert_in(&mut *tx, &order).await?;
            } else {
                return Err(err.into());
            }
        }
        for line in &lines {
            PosOrderRepository::insert_line_in(&mut *tx, line).await?;
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "pos_order",
                &order.id,
                "pos_order_created",
                json!({
                    "order_number": order.order_number,
                    "total_cents": order.total_cents,
                    "line_count": lines.len(),
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(order_number = %order.order_number, total = order.total_cents, "POS order created");
        Ok((order, lines))
    }

    /// Advances the order along Pending → Confirmed → Preparing → Ready →
    /// Served. Confirmation appends the Out movements for stock-linked
    /// menu items (one per line, reference = order number).
    pub async fn advance(
        &self,
        order_id: &str,
        to: OrderStatus,
        actor: &Actor,
    ) -> ServiceResult<PosOrder> {
        actor.require(Scope::FrontDesk)?;

        if to == OrderStatus::Cancelled {
            return self.cancel(order_id, actor).await;
        }

        // Stock-linked items are discovered up front so their locks can be
        // taken before the transaction opens.
        let stock_lines = if to == OrderStatus::Confirmed {
            self.stock_linked_lines(order_id).await?
        } else {
            Vec::new()
        };
        let item_ids: Vec<String> = stock_lines
            .iter()
            .map(|(_, item)| item.inventory_item_id.clone().unwrap_or_default())
            .collect();

        let locks = self.db.locks();
        let _item_guards = locks.items_sorted(&item_ids).await;

        let mut tx = self.db.pool().begin().await?;

        let mut order = PosOrderRepository::get_by_id_in(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PosOrder", order_id))?;

        if !order.status.can_transition_to(to) {
            return Err(
                CoreError::invalid_transition("PosOrder", order_id, order.status, to).into(),
            );
        }

        PosOrderRepository::update_status_in(&mut *tx, order_id, order.status, to).await?;

        if to == OrderStatus::Confirmed {
            for (line, item) in &stock_lines {
                let depleted = line.quantity().multiply(item.deplete_qty());
                apply_movement_in(
                    &mut tx,
                    item.inventory_item_id.as_deref().unwrap_or_default(),
                    MovementKind::Out,
                    depleted,
                    None,
                    Some(order.order_number.clone()),
                    Some(format!("POS {}", line.name_snapshot)),
                    actor,
                )
                .await?;
            }
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "pos_order",
                order_id,
                "pos_order_status_changed",
                json!({ "from": order.status, "to": to }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(order_id = %order_id, from = %order.status, to = %to, "POS order advanced");
        order.status = to;
        order.updated_at = Utc::now();
        Ok(order)
    }

    /// Cancels an order. Idempotent: cancelling a cancelled order is a
    /// no-op. Inventory decrements attributable to the order are reversed
    /// with Return movements sharing the order-number reference; the
    /// reversal itself is idempotent (outs without a matching return).
    pub async fn cancel(&self, order_id: &str, actor: &Actor) -> ServiceResult<PosOrder> {
        actor.require(Scope::FrontDesk)?;

        let order = self
            .db
            .pos_orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PosOrder", order_id))?;

        if order.status == OrderStatus::Cancelled {
            return Ok(order);
        }
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(CoreError::invalid_transition(
                "PosOrder",
                order_id,
                order.status,
                OrderStatus::Cancelled,
            )
            .into());
        }

        // Item locks for the reversal, discovered from the outs already
        // posted under this order's reference.
        let prior = {
            let mut conn = self.db.pool().acquire().await?;
            InventoryRepository::movements_by_reference_in(&mut conn, &order.order_number).await?
        };
        let item_ids: Vec<String> = prior.iter().map(|m| m.item_id.clone()).collect();

        let locks = self.db.locks();
        let _item_guards = locks.items_sorted(&item_ids).await;

        let mut tx = self.db.pool().begin().await?;

        let mut order = PosOrderRepository::get_by_id_in(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PosOrder", order_id))?;
        if order.status == OrderStatus::Cancelled {
            return Ok(order);
        }

        PosOrderRepository::update_status_in(&mut *tx, order_id, order.status, OrderStatus::Cancelled)
            .await?;

        let movements =
            InventoryRepository::movements_by_reference_in(&mut *tx, &order.order_number).await?;
        // Pair outs against existing returns so a re-run after a partial
        // reversal only appends what is still missing.
        let mut unmatched_returns: Vec<_> = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Return)
            .collect();
        for out in movements.iter().filter(|m| m.kind == MovementKind::Out) {
            if let Some(idx) = unmatched_returns.iter().position(|r| {
                r.item_id == out.item_id
                    && r.quantity_hundredths.abs() == out.quantity_hundredths.abs()
            }) {
                unmatched_returns.swap_remove(idx);
                continue;
            }
            apply_movement_in(
                &mut tx,
                &out.item_id,
                MovementKind::Return,
                out.quantity().abs(),
                Some(Money::from_cents(out.unit_cost_cents)),
                Some(order.order_number.clone()),
                Some("order cancelled".to_string()),
                actor,
            )
            .await?;
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "pos_order",
                order_id,
                "pos_order_cancelled",
                json!({ "from": order.status, "reversed_movements": movements.len() }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(order_id = %order_id, "POS order cancelled");
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        Ok(order)
    }

    /// Settles an order.
    ///
    /// `RoomCharge` requires a linked folio: posts ONE collapsed `food`
    /// charge equal to the order total (tax-inclusive) and records no
    /// payment row. Any other method records a payment row and marks the
    /// order Paid once Σ payments ≥ total.
    pub async fn pay(
        &self,
        order_id: &str,
        method: PaymentMethod,
        amount: Money,
        reference: Option<&str>,
        actor: &Actor,
    ) -> ServiceResult<PosOrder> {
        actor.require(Scope::FrontDesk)?;

        let mut tx = self.db.pool().begin().await?;

        let mut order = PosOrderRepository::get_by_id_in(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PosOrder", order_id))?;

        if order.status == OrderStatus::Cancelled {
            return Err(CoreError::invalid_transition(
                "PosOrder",
                order_id,
                order.status,
                order.status,
            )
            .into());
        }
        if order.payment_status != OrderPaymentStatus::Unpaid {
            return Err(CoreError::invalid_transition(
                "PosOrder",
                order_id,
                order.payment_status,
                if method == PaymentMethod::RoomCharge {
                    OrderPaymentStatus::ChargedToRoom
                } else {
                    OrderPaymentStatus::Paid
                },
            )
            .into());
        }

        if method == PaymentMethod::RoomCharge {
            let folio_id = order.folio_id.clone().ok_or_else(|| {
                CoreError::Validation(ValidationError::Required {
                    field: "folio_id".to_string(),
                })
            })?;
            if amount != order.total() {
                return Err(CoreError::Validation(ValidationError::InvalidFormat {
                    field: "amount".to_string(),
                    reason: format!(
                        "room charge must equal order total {}",
                        order.total()
                    ),
                })
                .into());
            }

            let mut target = FolioRepository::get_by_id_in(&mut *tx, &folio_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Folio", &folio_id))?;
            target.ensure_open()?;

            // Single collapsed charge: order total already carries POS
            // tax and service, so it is stored tax-inclusive.
            let charge = FolioCharge {
                id: new_id(),
                folio_id: target.id.clone(),
                kind: ChargeKind::Food,
                description: format!("POS order {}", order.order_number),
                amount_cents: order.total_cents,
                quantity_hundredths: Quantity::from_units(1).hundredths(),
                tax_inclusive: true,
                posted_by: actor.id.clone(),
                deleted_at: None,
                created_at: Utc::now(),
            };
            FolioRepository::insert_charge_in(&mut *tx, &charge).await?;

            let charges = FolioRepository::charges_in(&mut *tx, &target.id).await?;
            folio::recompute(&mut target, &charges, self.db.pms_config().tax_rate);
            debug_assert!(folio::invariants_hold(&target, &charges));
            FolioRepository::update_totals_in(&mut *tx, &target).await?;

            PosOrderRepository::update_payment_status_in(
                &mut *tx,
                order_id,
                OrderPaymentStatus::ChargedToRoom,
            )
            .await?;

            ActivityLogRepository::append_in(
                &mut *tx,
                &ActivityEvent::new(
                    "pos_order",
                    order_id,
                    "order_charged_to_room",
                    json!({
                        "folio_id": target.id,
                        "amount_cents": order.total_cents,
                        "folio_balance_cents": target.balance_cents,
                    }),
                    &actor.id,
                ),
            )
            .await?;

            order.payment_status = OrderPaymentStatus::ChargedToRoom;
        } else {
            let payment = Payment {
                id: new_id(),
                folio_id: None,
                order_id: Some(order.id.clone()),
                method,
                amount_cents: amount.cents(),
                reference: reference.map(str::to_string),
                received_by: actor.id.clone(),
                deleted_at: None,
                created_at: Utc::now(),
            };
            FolioRepository::insert_payment_in(&mut *tx, &payment).await?;

            let paid = FolioRepository::payments_total_for_order_in(&mut *tx, &order.id).await?;
            if paid >= order.total_cents {
                PosOrderRepository::update_payment_status_in(
                    &mut *tx,
                    order_id,
                    OrderPaymentStatus::Paid,
                )
                .await?;
                order.payment_status = OrderPaymentStatus::Paid;
            }

            ActivityLogRepository::append_in(
                &mut *tx,
                &ActivityEvent::new(
                    "pos_order",
                    order_id,
                    "payment_posted",
                    json!({
                        "method": method,
                        "amount_cents": amount.cents(),
                        "paid_cents": paid,
                    }),
                    &actor.id,
                ),
            )
            .await?;
        }

        tx.commit().await?;

        info!(order_id = %order_id, method = %method, "POS order payment");
        order.updated_at = Utc::now();
        Ok(order)
    }

    /// Lines of an order joined with their stock-linked menu items.
    async fn stock_linked_lines(
        &self,
        order_id: &str,
    ) -> ServiceResult<Vec<(PosOrderLine, MenuItem)>> {
        let lines = self.db.pos_orders().lines(order_id).await?;
        let mut linked = Vec::new();
        for line in lines {
            if let Some(item) = self.db.catalog().get_menu_item(&line.menu_item_id).await? {
                if item.tracks_stock() {
                    linked.push((line, item));
                }
            }
        }
        Ok(linked)
    }
}
