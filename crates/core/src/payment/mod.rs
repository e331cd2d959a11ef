//! Payment terms: due dates and the printed payment sentence.

pub mod terms;

pub use terms::{PaymentTerm, PaymentTermCalculator, PaymentTermError};
