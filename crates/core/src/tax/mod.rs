//! Tax rates and tax determination.
//!
//! - `types` - Tax rate value type and the customer tax profile
//! - `resolver` - The domestic / EU / export decision table
//! - `error` - Errors for invalid rates

pub mod error;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod resolver_props;

pub use error::TaxError;
pub use resolver::{TaxDetermination, TaxRateResolver, TaxTreatment};
pub use types::{CustomerTaxProfile, TaxRate};
