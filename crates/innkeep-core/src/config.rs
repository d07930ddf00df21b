//! # Configuration
//!
//! Process-level configuration for the PMS core.
//!
//! ## Configuration Sources
//! ```text
//! 1. Environment variables (highest priority)
//!    TAX_RATE=0.10  SERVICE_CHARGE_RATE=0.05  FOLIO_NUMBER_PREFIX=F  CURRENCY=USD
//! 2. Default values
//!    10% tax, 5% service charge, "F" prefix, "USD"
//! ```
//!
//! Rates are parsed from fractional form (`0.10`) into basis points.
//! Database connection settings live in `innkeep-db`; this struct only
//! carries the knobs the business rules read.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::money::Rate;

/// Defaults applied when no environment override is present.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;
pub const DEFAULT_SERVICE_CHARGE_BPS: u32 = 500;
pub const DEFAULT_FOLIO_NUMBER_PREFIX: &str = "F";
pub const DEFAULT_CURRENCY: &str = "USD";

/// PMS business configuration.
///
/// `tax_rate` applies to folio totals and POS subtotals; `service_charge_rate`
/// applies to POS subtotals only. `currency` is display metadata; all
/// arithmetic is currency-agnostic fixed point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmsConfig {
    pub tax_rate: Rate,
    pub service_charge_rate: Rate,
    pub folio_number_prefix: String,
    pub currency: String,
}

impl Default for PmsConfig {
    fn default() -> Self {
        PmsConfig {
            tax_rate: Rate::from_bps(DEFAULT_TAX_RATE_BPS),
            service_charge_rate: Rate::from_bps(DEFAULT_SERVICE_CHARGE_BPS),
            folio_number_prefix: DEFAULT_FOLIO_NUMBER_PREFIX.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl PmsConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults field by field. Malformed rate values are ignored with a
    /// warning rather than aborting startup.
    pub fn from_env() -> Self {
        let mut config = PmsConfig::default();

        if let Ok(raw) = std::env::var("TAX_RATE") {
            match raw.parse::<f64>() {
                Ok(fraction) if (0.0..1.0).contains(&fraction) => {
                    config.tax_rate = Rate::from_fraction(fraction);
                }
                _ => warn!(value = %raw, "ignoring malformed TAX_RATE"),
            }
        }

        if let Ok(raw) = std::env::var("SERVICE_CHARGE_RATE") {
            match raw.parse::<f64>() {
                Ok(fraction) if (0.0..1.0).contains(&fraction) => {
                    config.service_charge_rate = Rate::from_fraction(fraction);
                }
                _ => warn!(value = %raw, "ignoring malformed SERVICE_CHARGE_RATE"),
            }
        }

        if let Ok(prefix) = std::env::var("FOLIO_NUMBER_PREFIX") {
            if !prefix.trim().is_empty() {
                config.folio_number_prefix = prefix.trim().to_string();
            }
        }

        if let Ok(currency) = std::env::var("CURRENCY") {
            if !currency.trim().is_empty() {
                config.currency = currency.trim().to_uppercase();
            }
        }

        config
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
