//! Document error types for validation and calculation failures.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::DocumentStatus;
use billrun_shared::types::ItemId;

/// Broad class of a document error, used to pick the ledger category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentErrorKind {
    /// Required input missing or malformed.
    Validation,
    /// Invariant violated while computing totals.
    Calculation,
}

/// Errors that can occur while building or calculating a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    // ========== Validation Errors ==========
    /// Document has no lines.
    #[error("Document must have at least one line")]
    NoLines,

    /// Line has neither an explicit price nor a linked item.
    #[error("Line {position} has no unit price")]
    UnpricedLine {
        /// Line position.
        position: u32,
    },

    /// Line has neither an explicit tax rate nor a linked item.
    #[error("Line {position} has no tax rate")]
    MissingTaxRate {
        /// Line position.
        position: u32,
    },

    /// Linked item does not exist in the item master.
    #[error("Item {item_id} referenced by line {position} was not found")]
    ItemNotFound {
        /// Line position.
        position: u32,
        /// Missing item.
        item_id: ItemId,
    },

    /// No line at the given position.
    #[error("No line at position {0}")]
    LineNotFound(u32),

    /// Document lines can only change while in draft.
    #[error("Document in status {0} cannot be edited")]
    NotEditable(DocumentStatus),

    /// Status transition not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: DocumentStatus,
        /// Requested status.
        to: DocumentStatus,
    },

    // ========== Calculation Errors ==========
    /// Quantity is negative.
    #[error("Quantity {0} must not be negative")]
    NegativeQuantity(Decimal),

    /// Unit price is negative.
    #[error("Unit price {0} must not be negative")]
    NegativeUnitPrice(Decimal),

    /// Discount percent outside `0..=100`.
    #[error("Discount {0}% must be between 0 and 100")]
    DiscountOutOfRange(Decimal),

    /// Amount exceeds the decimal range.
    #[error("Amount overflow while calculating {0}")]
    Overflow(&'static str),
}

impl DocumentError {
    /// Returns whether this is a validation or calculation error.
    #[must_use]
    pub fn kind(&self) -> DocumentErrorKind {
        match self {
            Self::NoLines
            | Self::UnpricedLine { .. }
            | Self::MissingTaxRate { .. }
            | Self::ItemNotFound { .. }
            | Self::LineNotFound(_)
            | Self::NotEditable(_)
            | Self::InvalidStatusTransition { .. } => DocumentErrorKind::Validation,
            Self::NegativeQuantity(_)
            | Self::NegativeUnitPrice(_)
            | Self::DiscountOutOfRange(_)
            | Self::Overflow(_) => DocumentErrorKind::Calculation,
        }
    }

    /// Returns the error code for logs and the run ledger.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::UnpricedLine { .. } => "UNPRICED_LINE",
            Self::MissingTaxRate { .. } => "MISSING_TAX_RATE",
            Self::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::NotEditable(_) => "DOCUMENT_NOT_EDITABLE",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::NegativeQuantity(_) => "NEGATIVE_QUANTITY",
            Self::NegativeUnitPrice(_) => "NEGATIVE_UNIT_PRICE",
            Self::DiscountOutOfRange(_) => "DISCOUNT_OUT_OF_RANGE",
            Self::Overflow(_) => "AMOUNT_OVERFLOW",
        }
    }
}
