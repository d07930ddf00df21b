//! # Guests
//!
//! Minimal guest records: the stay lifecycle needs an identity to hang
//! reservations and folios on, and walk-ins upsert by email. CRM profile
//! features live outside the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Guest {
    pub id: String,
    pub full_name: String,
    /// Unique; the walk-in upsert key.
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
