//! # Folio Service
//!
//! Charge and payment posting against an open folio. Every mutation
//! recomputes the derived totals from the charge rows inside the same
//! transaction, so the ledger invariants hold at every observation point.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use innkeep_core::folio::{self, ChargeKind, Folio, FolioCharge};
use innkeep_core::money::{Money, Quantity, Rate};
use innkeep_core::payment::{Payment, PaymentMethod};
use innkeep_core::validation::{validate_name, validate_positive_amount};
use innkeep_core::{Actor, ActivityEvent, CoreError, Scope, ValidationError};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::folio::FolioRepository;
use crate::repository::new_id;

/// Folio ledger operations.
#[derive(Debug, Clone)]
pub struct FolioService {
    db: Database,
}

impl FolioService {
    pub fn new(db: Database) -> Self {
        FolioService { db }
    }

    /// Appends a charge line and recomputes the folio. Fails with
    /// `FolioSealed` once the folio is settled.
    pub async fn post_charge(
        &self,
        folio_id: &str,
        kind: ChargeKind,
        description: &str,
        amount: Money,
        quantity: Quantity,
        actor: &Actor,
    ) -> ServiceResult<Folio> {
        actor.require(Scope::FrontDesk)?;
        validate_name("description", description).map_err(CoreError::from)?;
        validate_positive_amount("amount", amount).map_err(CoreError::from)?;

        let mut tx = self.db.pool().begin().await?;

        let mut target = FolioRepository::get_by_id_in(&mut *tx, folio_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Folio", folio_id))?;
        target.ensure_open()?;

        let charge = FolioCharge {
            id: new_id(),
            folio_id: target.id.clone(),
            kind,
            description: description.trim().to_string(),
            amount_cents: amount.cents(),
            quantity_hundredths: quantity.hundredths(),
            tax_inclusive: false,
            posted_by: actor.id.clone(),
            deleted_at: None,
            created_at: Utc::now(),
        };
        FolioRepository::insert_charge_in(&mut *tx, &charge).await?;

        let charges = FolioRepository::charges_in(&mut *tx, &target.id).await?;
        folio::recompute(&mut target, &charges, self.db.pms_config().tax_rate);
        debug_assert!(folio::invariants_hold(&target, &charges));
        FolioRepository::update_totals_in(&mut *tx, &target).await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "folio",
                &target.id,
                "charge_posted",
                json!({
                    "kind": kind,
                    "amount_cents": amount.cents(),
                    "balance_cents": target.balance_cents,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(folio_id = %target.id, kind = %kind, amount = %amount, "charge posted");
        Ok(target)
    }

    /// Records a payment and re-derives the balance. Overpayment is
    /// carried as a credit. `RoomCharge` is a POS-only method and is
    /// rejected here.
    pub async fn post_payment(
        &self,
        folio_id: &str,
        method: PaymentMethod,
        amount: Money,
        reference: Option<&str>,
        actor: &Actor,
    ) -> ServiceResult<Folio> {
        actor.require(Scope::FrontDesk)?;
        validate_positive_amount("amount", amount).map_err(CoreError::from)?;
        if method == PaymentMethod::RoomCharge {
            return Err(CoreError::Validation(ValidationError::InvalidFormat {
                field: "method".to_string(),
                reason: "room_charge settles POS orders, not folios".to_string(),
            })
            .into());
        }

        let mut tx = self.db.pool().begin().await?;

        let mut target = FolioRepository::get_by_id_in(&mut *tx, folio_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Folio", folio_id))?;
        target.ensure_open()?;

        let payment = Payment {
            id: new_id(),
            folio_id: Some(target.id.clone()),
            order_id: None,
            method,
            amount_cents: amount.cents(),
            reference: reference.map(str::to_string),
            received_by: actor.id.clone(),
            deleted_at: None,
            created_at: Utc::now(),
        };
        FolioRepository::insert_payment_in(&mut *tx, &payment).await?;

        folio::apply_payment(&mut target, amount);
        FolioRepository::update_totals_in(&mut *tx, &target).await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "folio",
                &target.id,
                "payment_posted",
                json!({
                    "method": method,
                    "amount_cents": amount.cents(),
                    "balance_cents": target.balance_cents,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(folio_id = %target.id, method = %method, amount = %amount, "payment posted");
        Ok(target)
    }

    /// Replaces the folio's tax amount by recomputing against the given
    /// rate (rate changes, tax-exempt stays). Totals and balance are
    /// re-derived in the same pass.
    pub async fn tax_recompute(
        &self,
        folio_id: &str,
        tax_rate: Rate,
        actor: &Actor,
    ) -> ServiceResult<Folio> {
        actor.require(Scope::FrontDesk)?;

        let mut tx = self.db.pool().begin().await?;

        let mut target = FolioRepository::get_by_id_in(&mut *tx, folio_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Folio", folio_id))?;
        target.ensure_open()?;

        let charges = FolioRepository::charges_in(&mut *tx, &target.id).await?;
        folio::recompute(&mut target, &charges, tax_rate);
        debug_assert!(folio::invariants_hold(&target, &charges));
        FolioRepository::update_totals_in(&mut *tx, &target).await?;

        ActivityLogRepository::append_in(
            &mut *tx,
            &ActivityEvent::new(
                "folio",
                &target.id,
                "tax_recomputed",
                json!({
                    "tax_rate_bps": tax_rate.bps(),
                    "tax_amount_cents": target.tax_amount_cents,
                }),
                &actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        info!(folio_id = %target.id, bps = tax_rate.bps(), "folio tax recomputed");
        Ok(target)
    }
}
