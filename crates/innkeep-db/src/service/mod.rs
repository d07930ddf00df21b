//! # Services
//!
//! The state-changing operations of the PMS core, each executed as a single database
//! transaction with its activity events appended before commit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  booking      create / confirm / cancel / no-show                   │
//! │  front_desk   check-in / check-out / walk-in                        │
//! │  folio        post charge / post payment / tax recompute            │
//! │  pos          order lifecycle, totals, pay (incl. room charge)      │
//! │  stock        movements, transfers, stock takes, purchase orders    │
//! │  housekeeping room status changes outside the check-in machine      │
//! │  night_audit  idempotent daily close                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock ordering: advisory locks (property / item) are always acquired
//! BEFORE the transaction begins, and multi-item lock sets are taken in
//! sorted order.

pub mod booking;
pub mod folio;
pub mod front_desk;
pub mod housekeeping;
pub mod night_audit;
pub mod pos;
pub mod stock;
