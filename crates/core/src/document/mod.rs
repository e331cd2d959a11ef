//! Financial documents and their calculation.
//!
//! This module implements:
//! - Sales document and line types with computed totals
//! - The per-line calculator and document aggregation
//! - The item snapshot applied when a line is created
//! - Error types for validation and calculation failures

pub mod calculator;
pub mod error;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::LineCalculator;
pub use error::{DocumentError, DocumentErrorKind};
pub use snapshot::{ItemMaster, LineDraft, SnapshotApplier};
pub use types::{
    DocumentStatus, DocumentTotals, DocumentType, LineTotals, NewDocumentLine, SalesDocument,
    SalesDocumentLine, TaxBucket,
};
