//! # Stock Service
//!
//! Movement appends, transfers, stock takes, and purchase-order
//! receiving. Every on-hand change is a movement row plus the item update
//! in one transaction, under the per-item advisory lock.

use chrono::Utc;
use serde_json::json;
use sqlx::{Sqlite, Transaction};
use tracing::info;

use innkeep_core::inventory::{
    count_difference, movement_total_cost, MovementKind, PurchaseOrder, PurchaseOrderLine,
    PurchaseOrderStatus, StockMovement, StockTake, StockTakeLine, StockTakeStatus,
};
use innkeep_core::money::{Money, Quantity};
use innkeep_core::{Actor, ActivityEvent, CoreError, Scope, ValidationError};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::new_id;
use crate::repository::procurement::{
    generate_po_number, generate_stock_take_reference, PurchaseOrderRepository,
    StockTakeRepository,
};

/// Parameters for a manual stock movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub item_id: String,
    pub kind: MovementKind,
    /// Magnitude for In/Out/Return/Waste; signed for Adjustment.
    pub quantity: Quantity,
    /// Defaults to the item's cost price.
    pub unit_cost: Option<Money>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// One physical count within a stock take.
#[derive(Debug, Clone)]
pub struct StockTakeCount {
    pub item_id: String,
    pub physical: Quantity,
}

/// One requested purchase-order line.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrderLine {
    pub item_id: String,
    pub quantity: Quantity,
    pub unit_cost: Money,
}

/// Inventory movement engine operations.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
}

impl StockService {
    pub fn new(db: Database) -> Self {
        StockService { db }
    }

    /// Appends one movement and adjusts on-hand atomically. Rejects
    /// movements that would drive stock below zero for every kind except
    /// Adjustment.
    pub async fn append_movement(
        &self,
        new: NewMovement,
        actor: &Actor,
    ) -> ServiceResult<StockMovement> {
        actor.require(Scope::Inventory)?;

        if new.quantity.is_zero() {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })
            .into());
        }

        let locks = self.db.locks();
        let _item_guard = locks.item(&new.item_id).await;

        let mut tx = self.db.pool().begin().await?;

        let movement = apply_movement_in(
            &mut tx,
            &new.item_id,
            new.kind,
            new.quantity,
            new.unit_cost,
            new.reference,
            new.notes,
            actor,
        )
        .await?;

        tx.commit().await?;

        info!(
            item_id = %movement.item_id,
            kind = %movement.kind,
            qty = %movement.quantity(),
            "stock movement appended"
        );
        Ok(movement)
    }

    /// Paired transfer between two items (locations): a Transfer-out leg
    /// on `from` and a Transfer-in leg on `to`, sharing one reference.
    pub async fn transfer(
        &self,
        from_item_id: &str,
        to_item_id: &str,
        quantity: Quantity,
        reference: Option<String>,
        actor: &Actor,
    ) -> ServiceResult<(StockMovement, StockMovement)> {
        actor.require(Scope::Inventory)?;

        if quantity.hundredths() <= 0 {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })
            .into());
        }

        let reference = reference.unwrap_or_else(|| format!("TRF-{}", &new_id()[..8]));

        let locks = self.db.locks();
        let _guards = locks
            .items_sorted(&[from_item_id.to_string(), to_item_id.to_string()])
            .await;

        let mut tx = self.db.pool().begin().await?;

        let out_leg = apply_movement_in(
            &mut tx,
            from_item_id,
            MovementKind::Transfer,
            -quantity,
            None,
            Some(reference.clone()),
            Some(format!("transfer to {to_item_id}")),
            actor,
        )
        .await?;
        let in_leg = apply_movement_in(
            &mut tx,
            to_item_id,
            MovementKind::Transfer,
            quantity,
            None,
            Some(reference.clone()),
            Some(format!("transfer from {from_item_id}")),
            actor,
        )
        .await?;

        tx.commit().await?;

        info!(from = %from_item_id, to = %to_item_id, reference = %reference, "stock transferred");
        Ok((out_leg, in_leg))
    }

    // -------------------------------------------------------------------------
    // Stock takes
    // -------------------------------------------------------------------------

    /// Records a count batch as Draft: system quantities are snapshotted
    /// and differences computed now; nothing moves until finalize.
    pub async fn create_stock_take(
        &self,
        property_id: &str,
        counts: Vec<StockTakeCount>,
        notes: Option<String>,
        actor: &Actor,
    ) -> ServiceResult<(StockTake, Vec<StockTakeLine>)> {
        actor.require(Scope::Inventory)?;

        if counts.is_empty() {
            return Err(CoreError::Validation(ValidationError::Required {
                field: "counts".to_string(),
            })
            .into());
        }

        let mut tx = self.db.pool().begin().await?;

        let now = Utc::now();
        let mut take = StockTake {
            id: new_id(),
            property_id: property_id.to_string(),
            reference_number: generate_stock_take_reference(),
            status: StockTakeStatus::Draft,
            notes,
            created_by: actor.id.clone(),
            started_at: now,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = StockTakeRepository::insert_in(&mut *tx, &take).await {
            if err.is_unique_violation_on("reference_number") {
                take.reference_number = generate_stock_take_reference();
                StockTakeRepository::insert_in(&mut *tx, &take).await?;
            } else {
                return Err(err.into());
            }
        }

        let mut lines = Vec::with_capacity(counts.len());
        for count in &counts {
            let item = InventoryRepository::get_item_in(&mut *tx, &count.item_id)
                .await?
                .ok_or_else(|| CoreError::not_found("InventoryItem", &count.item_id))?;

            let (difference, value_difference) =
                count_difference(item.on_hand(), count.physical, item.cost_price());

            let line = StockTakeLine {
                id: new_id(),
                stock_take_id: take.id.clone(),
                item_id: item.id.clone(),
                system_qty_hundredths: item.on_hand_hundredths,
                physical_qty_hundredths: count.physical.hundredths(),
                unit_cost_cents: item.cost_price_cents,
                difference_hundredths: difference.hundredths(),
                value_difference_cents: value_difference.cents(),
            };
            StockTakeRepository::insert_line_in(&mut *tx, &line).await?;
            lines.push(line);
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "stock_take",
                &take.id,
                "stock_take_created",
                json!({
                    "reference_number": take.reference_number,
                    "line_count": lines.len(),
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(reference = %take.reference_number, lines = lines.len(), "stock take created");
        Ok((take, lines))
    }

    /// Finalizes a Draft batch: one Adjustment movement per nonzero
    /// difference, atomically, then the batch is frozen.
    pub async fn finalize_stock_take(
        &self,
        stock_take_id: &str,
        actor: &Actor,
    ) -> ServiceResult<Vec<StockMovement>> {
        actor.require(Scope::Inventory)?;

        let lines = self.db.stock_takes().lines(stock_take_id).await?;
        let item_ids: Vec<String> = lines.iter().map(|l| l.item_id.clone()).collect();

        let locks = self.db.locks();
        let _guards = locks.items_sorted(&item_ids).await;

        let mut tx = self.db.pool().begin().await?;

        let take = StockTakeRepository::get_by_id_in(&mut *tx, stock_take_id)
            .await?
            .ok_or_else(|| CoreError::not_found("StockTake", stock_take_id))?;

        if take.status != StockTakeStatus::Draft {
            return Err(CoreError::invalid_transition(
                "StockTake",
                stock_take_id,
                take.status,
                StockTakeStatus::Finalized,
            )
            .into());
        }

        let now = Utc::now();
        StockTakeRepository::mark_finalized_in(&mut *tx, stock_take_id, now).await?;

        let lines = StockTakeRepository::lines_in(&mut *tx, stock_take_id).await?;
        let mut adjustments = Vec::new();
        for line in lines.iter().filter(|l| l.difference_hundredths != 0) {
            let movement = apply_movement_in(
                &mut tx,
                &line.item_id,
                MovementKind::Adjustment,
                line.difference(),
                Some(Money::from_cents(line.unit_cost_cents)),
                Some(take.reference_number.clone()),
                Some("stock take reconciliation".to_string()),
                actor,
            )
            .await?;
            adjustments.push(movement);
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "stock_take",
                stock_take_id,
                "stock_take_finalized",
                json!({
                    "reference_number": take.reference_number,
                    "adjustments": adjustments.len(),
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(
            reference = %take.reference_number,
            adjustments = adjustments.len(),
            "stock take finalized"
        );
        Ok(adjustments)
    }

    // -------------------------------------------------------------------------
    // Purchase orders
    // -------------------------------------------------------------------------

    /// Creates a Draft purchase order.
    pub async fn create_purchase_order(
        &self,
        property_id: &str,
        supplier_id: &str,
        lines: Vec<NewPurchaseOrderLine>,
        notes: Option<String>,
        actor: &Actor,
    ) -> ServiceResult<(PurchaseOrder, Vec<PurchaseOrderLine>)> {
        actor.require(Scope::Inventory)?;

        if lines.is_empty() {
            return Err(CoreError::Validation(ValidationError::Required {
                field: "lines".to_string(),
            })
            .into());
        }

        let mut tx = self.db.pool().begin().await?;

        let now = Utc::now();
        let mut po = PurchaseOrder {
            id: new_id(),
            po_number: generate_po_number(),
            property_id: property_id.to_string(),
            supplier_id: supplier_id.to_string(),
            status: PurchaseOrderStatus::Draft,
            notes,
            created_by: actor.id.clone(),
            placed_at: None,
            received_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = PurchaseOrderRepository::insert_in(&mut *tx, &po).await {
            if err.is_unique_violation_on("po_number") {
                po.po_number = generate_po_number();
                PurchaseOrderRepository::insert_in(&mut *tx, &po).await?;
            } else {
                return Err(err.into());
            }
        }

        let mut inserted = Vec::with_capacity(lines.len());
        for requested in &lines {
            let item = InventoryRepository::get_item_in(&mut *tx, &requested.item_id)
                .await?
                .ok_or_else(|| CoreError::not_found("InventoryItem", &requested.item_id))?;

            let line = PurchaseOrderLine {
                id: new_id(),
                purchase_order_id: po.id.clone(),
                item_id: item.id,
                quantity_hundredths: requested.quantity.hundredths(),
                unit_cost_cents: requested.unit_cost.cents(),
                line_total_cents: movement_total_cost(requested.unit_cost, requested.quantity)
                    .cents(),
            };
            PurchaseOrderRepository::insert_line_in(&mut *tx, &line).await?;
            inserted.push(line);
        }

        tx.commit().await?;

        info!(po_number = %po.po_number, lines = inserted.len(), "purchase order created");
        Ok((po, inserted))
    }

    /// Draft → Placed.
    pub async fn place_purchase_order(
        &self,
        purchase_order_id: &str,
        actor: &Actor,
    ) -> ServiceResult<PurchaseOrder> {
        actor.require(Scope::Inventory)?;

        let mut tx = self.db.pool().begin().await?;

        let mut po = PurchaseOrderRepository::get_by_id_in(&mut *tx, purchase_order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PurchaseOrder", purchase_order_id))?;

        if !po.status.can_transition_to(PurchaseOrderStatus::Placed) {
            return Err(CoreError::invalid_transition(
                "PurchaseOrder",
                purchase_order_id,
                po.status,
                PurchaseOrderStatus::Placed,
            )
            .into());
        }

        PurchaseOrderRepository::update_status_in(
            &mut *tx,
            purchase_order_id,
            po.status,
            PurchaseOrderStatus::Placed,
        )
        .await?;

        tx.commit().await?;

        po.status = PurchaseOrderStatus::Placed;
        po.placed_at = Some(Utc::now());
        Ok(po)
    }

    /// Placed → Received: one In movement per line, atomically. Receiving
    /// twice is an InvalidTransition.
    pub async fn receive_purchase_order(
        &self,
        purchase_order_id: &str,
        actor: &Actor,
    ) -> ServiceResult<Vec<StockMovement>> {
        actor.require(Scope::Inventory)?;

        let line_items: Vec<String> = {
            let mut conn = self.db.pool().acquire().await?;
            PurchaseOrderRepository::lines_in(&mut conn, purchase_order_id)
                .await?
                .into_iter()
                .map(|l| l.item_id)
                .collect()
        };

        let locks = self.db.locks();
        let _guards = locks.items_sorted(&line_items).await;

        let mut tx = self.db.pool().begin().await?;

        let po = PurchaseOrderRepository::get_by_id_in(&mut *tx, purchase_order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PurchaseOrder", purchase_order_id))?;

        if !po.status.can_transition_to(PurchaseOrderStatus::Received) {
            return Err(CoreError::invalid_transition(
                "PurchaseOrder",
                purchase_order_id,
                po.status,
                PurchaseOrderStatus::Received,
            )
            .into());
        }

        PurchaseOrderRepository::update_status_in(
            &mut *tx,
            purchase_order_id,
            po.status,
            PurchaseOrderStatus::Received,
        )
        .await?;

        let lines = PurchaseOrderRepository::lines_in(&mut *tx, purchase_order_id).await?;
        let mut received = Vec::with_capacity(lines.len());
        for line in &lines {
            let movement = apply_movement_in(
                &mut tx,
                &line.item_id,
                MovementKind::In,
                line.quantity(),
                Some(line.unit_cost()),
                Some(po.po_number.clone()),
                Some("purchase order receipt".to_string()),
                actor,
            )
            .await?;
            received.push(movement);
        }

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "purchase_order",
                purchase_order_id,
                "po_received",
                json!({
                    "po_number": po.po_number,
                    "line_count": lines.len(),
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(po_number = %po.po_number, "purchase order received");
        Ok(received)
    }
}

/// Appends one movement row and the matching on-hand write inside the
/// caller's transaction, enforcing non-negativity for the kinds that
/// forbid it.
///
/// Shared by the stock service, POS confirmation (Out), POS cancellation
/// (Return), stock-take finalize (Adjustment), and PO receipt (In). The
/// caller holds the per-item advisory lock.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn apply_movement_in(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: &str,
    kind: MovementKind,
    quantity: Quantity,
    unit_cost: Option<Money>,
    reference: Option<String>,
    notes: Option<String>,
    actor: &Actor,
) -> ServiceResult<StockMovement> {
    let item = InventoryRepository::get_item_in(&mut *tx, item_id)
        .await?
        .ok_or_else(|| CoreError::not_found("InventoryItem", item_id))?;

    let delta = kind.signed_delta(quantity);
    let new_on_hand = item.on_hand() + delta;
    if new_on_hand.is_negative() && !kind.allows_negative() {
        return Err(CoreError::NegativeStock {
            sku: item.sku.clone(),
            on_hand: item.on_hand(),
            requested: delta.abs(),
        }
        .into());
    }

    let unit_cost = unit_cost.unwrap_or_else(|| item.cost_price());
    let movement = StockMovement {
        id: new_id(),
        item_id: item.id.clone(),
        kind,
        quantity_hundredths: quantity.hundredths(),
        unit_cost_cents: unit_cost.cents(),
        total_cost_cents: movement_total_cost(unit_cost, quantity).cents(),
        reference,
        notes,
        performed_by: actor.id.clone(),
        created_at: Utc::now(),
    };

    InventoryRepository::insert_movement_in(&mut *tx, &movement).await?;
    InventoryRepository::update_on_hand_in(&mut *tx, &item.id, new_on_hand).await?;

    ActivityLogRepository::append_in(
        &mut *tx,
        &ActivityEvent::new(
            "inventory_item",
            &item.id,
            "stock_movement",
            json!({
                "kind": kind,
                "quantity_hundredths": quantity.hundredths(),
                "on_hand_hundredths": new_on_hand.hundredths(),
                "reference": movement.reference,
            }),
            &actor.id,
        ),
    )
    .await?;

    Ok(movement)
}
