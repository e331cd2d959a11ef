//! Tax rate value type and customer tax profile.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TaxError;

/// A tax rate stored as a fraction (`0.19` for 19 %).
///
/// Ordered and hashable so it can key the per-rate subtotal buckets of a
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Zero rate (exports, reverse charge).
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a rate from a fraction.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::RateOutOfRange` unless `0 <= fraction <= 1`.
    pub fn new(fraction: Decimal) -> Result<Self, TaxError> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(TaxError::RateOutOfRange(fraction));
        }
        Ok(Self(fraction.normalize()))
    }

    /// Creates a rate from a percentage (`19` for 19 %).
    ///
    /// # Errors
    ///
    /// Returns `TaxError::RateOutOfRange` unless `0 <= percent <= 100`.
    pub fn from_percent(percent: Decimal) -> Result<Self, TaxError> {
        Self::new(percent / Decimal::ONE_HUNDRED)
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn fraction(self) -> Decimal {
        self.0
    }

    /// The rate as a percentage.
    #[must_use]
    pub fn percent(self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    /// Returns true for a 0 % rate.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Tax-relevant fields of a customer (or its billing address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTaxProfile {
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// Whether the country is an EU member state.
    pub is_eu: bool,
    /// Whether the customer is a business (B2B).
    pub is_business: bool,
    /// VAT identification number, if any.
    pub vat_id: Option<String>,
}

impl CustomerTaxProfile {
    /// Returns true if a non-blank VAT id is present.
    #[must_use]
    pub fn has_vat_id(&self) -> bool {
        self.vat_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}
