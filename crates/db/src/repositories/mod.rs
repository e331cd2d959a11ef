//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the billing engine.

pub mod billing;

pub use billing::BillingRepository;
