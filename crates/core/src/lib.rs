//! Core billing logic for Billrun.
//!
//! This crate contains the calculation and billing engine with ZERO web or
//! database dependencies. Storage is reached only through the traits in
//! [`contract::store`].
//!
//! # Modules
//!
//! - `money` - Rounding and fixed-point helpers
//! - `tax` - Tax rates and the tax determination table
//! - `payment` - Payment terms, due dates and payment text
//! - `document` - Sales documents, line calculation and item snapshots
//! - `contract` - Recurring contracts, invoice generation and the billing run

pub mod contract;
pub mod document;
pub mod money;
pub mod payment;
pub mod tax;
