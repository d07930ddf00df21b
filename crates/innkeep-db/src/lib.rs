//! # innkeep-db: Database Layer for Innkeep
//!
//! SQLite persistence and the transaction-scoped services implementing
//! the stay lifecycle and stock movement engines.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     innkeep-db (THIS CRATE)                         │
//! │                                                                     │
//! │   ┌───────────────┐   ┌────────────────┐   ┌──────────────────┐    │
//! │   │   Database    │   │  Repositories  │   │    Services      │    │
//! │   │   (pool.rs)   │◄──│  rooms, folios │◄──│  front_desk, pos │    │
//! │   │  + PmsConfig  │   │  inventory, …  │   │  stock, audit, … │    │
//! │   │  + locks      │   └────────────────┘   └──────────────────┘    │
//! │   └───────┬───────┘        row mapping        one transaction      │
//! │           │              (FromRow, scoped)     per operation       │
//! │           ▼                                                        │
//! │   SQLite (WAL) + embedded migrations                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, [`Database`] handle, configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`locks`] - Advisory lock registry (per property, per item)
//! - [`repository`] - Row access, soft-delete scoping
//! - [`service`] - The state-machine operations, one transaction each
//!
//! ## Usage
//!
//! ```rust,ignore
//! use innkeep_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("innkeep.db")).await?;
//! let (record, folio) = db.front_desk().check_in(request, &actor).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityLogRepository;
pub use repository::audit::NightAuditRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::checkin::CheckInRepository;
pub use repository::folio::FolioRepository;
pub use repository::guest::GuestRepository;
pub use repository::inventory::{InventoryRepository, NewInventoryItem};
pub use repository::pos::PosOrderRepository;
pub use repository::procurement::{PurchaseOrderRepository, StockTakeRepository};
pub use repository::reservation::ReservationRepository;
pub use repository::room::RoomRepository;

// Service re-exports
pub use service::booking::{BookingService, NewReservation};
pub use service::folio::FolioService;
pub use service::front_desk::{
    CheckInRequest, CheckOutRequest, FrontDeskService, SettlementPayment, WalkInRequest,
};
pub use service::housekeeping::HousekeepingService;
pub use service::night_audit::NightAuditService;
pub use service::pos::{NewOrder, NewOrderLine, PosService};
pub use service::stock::{
    NewMovement, NewPurchaseOrderLine, StockService, StockTakeCount,
};
