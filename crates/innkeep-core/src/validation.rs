//! # Validation Module
//!
//! Business-rule validation applied at the service boundary, before the
//! state machines run. The database's NOT NULL / UNIQUE / FK constraints
//! remain the last line of defense.
//!
//! ## Usage
//! ```rust
//! use innkeep_core::validation::{validate_sku, validate_room_number};
//!
//! validate_sku("TOWEL-L").unwrap();
//! validate_room_number("101").unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Quantity};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// Field length ceilings shared with the schema.
const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 50;
const MAX_ROOM_NUMBER_LEN: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name (guest, item, description).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a SKU: non-empty, bounded, alphanumeric plus `-` and `_`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a room number: non-empty and bounded.
pub fn validate_room_number(room_number: &str) -> ValidationResult<()> {
    let room_number = room_number.trim();

    if room_number.is_empty() {
        return Err(ValidationError::Required {
            field: "room_number".to_string(),
        });
    }

    if room_number.len() > MAX_ROOM_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "room_number".to_string(),
            max: MAX_ROOM_NUMBER_LEN,
        });
    }

    Ok(())
}

/// Shallow email shape check; deliverability is the mailer's problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain.tld".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount that must be strictly positive (charges,
/// payments, rates).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a quantity that must be strictly positive.
pub fn validate_positive_quantity(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if quantity.hundredths() <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates guest headcount: at least one adult, bounded party size.
pub fn validate_guest_counts(adults: i64, children: i64) -> ValidationResult<()> {
    if adults < 1 {
        return Err(ValidationError::MustBePositive {
            field: "adults".to_string(),
        });
    }
    if !(0..=20).contains(&children) || adults > 20 {
        return Err(ValidationError::OutOfRange {
            field: "guests".to_string(),
            min: 1,
            max: 20,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TOWEL-L").is_ok());
        assert!(validate_sku("coffee_1kg").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has spaces").is_err());
        assert!(validate_sku(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_room_number() {
        assert!(validate_room_number("101").is_ok());
        assert!(validate_room_number("1204-A").is_ok());
        assert!(validate_room_number("  ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("guest@example.com").is_ok());
        assert!(validate_email("guest@localhost").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount("amount", Money::from_cents(100)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_positive_amount("amount", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_guest_counts() {
        assert!(validate_guest_counts(2, 1).is_ok());
        assert!(validate_guest_counts(0, 0).is_err());
        assert!(validate_guest_counts(2, -1).is_err());
        assert!(validate_guest_counts(25, 0).is_err());
    }
}
