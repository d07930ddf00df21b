//! # innkeep-core: Pure Business Logic for Innkeep
//!
//! This crate contains the business rules of the property-management core
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Innkeep Data Flow                              │
//! │                                                                     │
//! │  Reservation ──► Check-In ──► Occupied Room + Folio                 │
//! │                                   │                                 │
//! │  POS orders ──► folio charges ────┤                                 │
//! │  Payments   ──► balance ──────────┤                                 │
//! │                                   ▼                                 │
//! │  Check-Out ──► sealed Folio + Dirty Room ──► Night Audit            │
//! │                                                                     │
//! │  ★ innkeep-core (THIS CRATE) holds the rules for every arrow ★      │
//! │  innkeep-db executes them inside database transactions              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money / Rate / Quantity fixed-point types (no floating point!)
//! - [`error`] - Domain error types
//! - [`config`] - Tax, service-charge, and numbering configuration
//! - [`actor`] - Operation actors and role scopes
//! - [`catalog`] - Reference data (room types, floors, menu items, suppliers)
//! - [`room`] - Rooms and the room-status machine
//! - [`reservation`] - Reservations and the booking state machine
//! - [`checkin`] - Check-in records and folio numbering
//! - [`guest`] - Guest records (walk-in upsert identity)
//! - [`folio`] - The guest folio ledger and its recomputation rules
//! - [`payment`] - Payments and tender methods
//! - [`pos`] - POS orders, line math, and the order state machine
//! - [`inventory`] - Inventory items, stock movements, stock takes, POs
//! - [`audit`] - Night-audit records and day counters
//! - [`event`] - Activity events emitted by state-machine operations
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, no side effects
//! 2. **Integer Money**: all monetary values are cents (i64), quantities are
//!    hundredths of a unit; rate application rounds half-even
//! 3. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod actor;
pub mod audit;
pub mod catalog;
pub mod checkin;
pub mod config;
pub mod error;
pub mod event;
pub mod folio;
pub mod guest;
pub mod inventory;
pub mod money;
pub mod payment;
pub mod pos;
pub mod reservation;
pub mod room;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use actor::{Actor, Role, Scope};
pub use config::PmsConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use event::ActivityEvent;
pub use money::{Money, Quantity, Rate};
