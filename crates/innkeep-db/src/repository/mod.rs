//! # Repository Module
//!
//! One repository per aggregate, each a thin struct over the pool.
//!
//! ## Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  • reads take &self and query the pool                              │
//! │  • writes that participate in a multi-step operation are            │
//! │    associated functions over &mut SqliteConnection, so services     │
//! │    can run them inside one transaction                              │
//! │  • default query scope excludes deleted_at rows; *_with_deleted     │
//! │    and hard_delete are the explicit escape hatches                  │
//! │  • rows_affected() == 0 on a guarded UPDATE maps to NotFound        │
//! │  • document-number generators live at the bottom of their file     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod activity;
pub mod audit;
pub mod catalog;
pub mod checkin;
pub mod folio;
pub mod guest;
pub mod inventory;
pub mod pos;
pub mod procurement;
pub mod reservation;
pub mod room;

use uuid::Uuid;

/// Generates a fresh entity id (UUID v4 as TEXT).
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
