//! # Error Types
//!
//! Domain-specific error types for innkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  innkeep-core errors (this file)                                    │
//! │  ├── CoreError        - state machine and ledger rule violations    │
//! │  └── ValidationError  - input validation failures                   │
//! │                                                                     │
//! │  innkeep-db errors (separate crate)                                 │
//! │  └── DbError          - storage failures, constraint mapping        │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → ServiceError → caller          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::{Money, Quantity};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant corresponds to one failure mode of the stay-lifecycle or
/// stock-movement engines. Operations abort their transaction and surface
/// these to the caller; nothing is recovered locally except a single retry
/// on `UniqueViolation` for regenerated document numbers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity absent or soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// State-machine precondition violated.
    ///
    /// Examples: check-out on a record that is not CheckedIn, confirming a
    /// cancelled reservation, serving a cancelled POS order.
    #[error("{entity} {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Room auto-assignment found no candidate for the requested type.
    #[error("no room of type {room_type_id} available in property {property_id}")]
    NoRoomAvailable {
        property_id: String,
        room_type_id: String,
    },

    /// Charge or payment attempted on a settled folio.
    #[error("folio {folio_id} is sealed; no further charges or payments")]
    FolioSealed { folio_id: String },

    /// Movement would drive stock on-hand below zero.
    #[error("insufficient stock for {sku}: on hand {on_hand}, requested {requested}")]
    NegativeStock {
        sku: String,
        on_hand: Quantity,
        requested: Quantity,
    },

    /// Settlement requested while the folio still carries a balance.
    #[error("folio {folio_id} balance is {balance}, settlement requires zero or credit")]
    BalanceNotZero { folio_id: String, balance: Money },

    /// Document number or (property, date) collision.
    #[error("duplicate {entity} {field}: '{value}' already exists")]
    UniqueViolation {
        entity: String,
        field: String,
        value: String,
    },

    /// Actor lacks the scope for the operation.
    #[error("{actor} is not permitted to perform {operation}")]
    AuthorizationDenied { actor: String, operation: String },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        CoreError::InvalidTransition {
            entity: entity.into(),
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs; callers translate these into their
/// own user-facing messages.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email or rate).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range where the end does not follow the start.
    #[error("{field}: check-out date must be after check-in date")]
    InvalidDateRange { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NegativeStock {
            sku: "TOWEL-L".to_string(),
            on_hand: Quantity::from_units(3),
            requested: Quantity::from_units(5),
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for TOWEL-L: on hand 3.00, requested 5.00"
        );

        let err = CoreError::BalanceNotZero {
            folio_id: "f-1".to_string(),
            balance: Money::from_cents(2200),
        };
        assert!(err.to_string().contains("$22.00"));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::invalid_transition("Reservation", "r-1", "Cancelled", "CheckedIn");
        assert_eq!(
            err.to_string(),
            "Reservation r-1: invalid transition Cancelled -> CheckedIn"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "room_number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
