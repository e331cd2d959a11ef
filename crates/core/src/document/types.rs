//! Sales document domain types.
//!
//! A document owns its lines. Every line holds a value copy of the pricing
//! data it was created from, and the document totals are always the sum of
//! the line totals.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billrun_shared::types::{
    ContractId, Currency, CustomerId, ItemId, PaymentTermId, SalesDocumentId, SalesDocumentLineId,
};

use super::calculator::LineCalculator;
use super::error::DocumentError;
use crate::tax::TaxRate;

/// Kind of financial document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Invoice (the only type the billing runner generates).
    Invoice,
    /// Credit note.
    CreditNote,
    /// Quote / offer.
    Quote,
    /// Order confirmation.
    OrderConfirmation,
}

impl DocumentType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
            Self::Quote => "quote",
            Self::OrderConfirmation => "order_confirmation",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "invoice" => Some(Self::Invoice),
            "credit_note" => Some(Self::CreditNote),
            "quote" => Some(Self::Quote),
            "order_confirmation" => Some(Self::OrderConfirmation),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document status.
///
/// Valid transitions:
/// - Draft → Issued
/// - Issued → Paid
/// - Draft / Issued → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Lines can still change.
    Draft,
    /// Issued to the customer.
    Issued,
    /// Settled.
    Paid,
    /// Cancelled.
    Cancelled,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "issued" => Some(Self::Issued),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if lines may be added or removed.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net, tax and gross of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineTotals {
    /// Net amount after discount, rounded to cents.
    pub net: Decimal,
    /// Tax amount, rounded to cents.
    pub tax: Decimal,
    /// `net + tax`.
    pub gross: Decimal,
}

/// Subtotal of all lines sharing one tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxBucket {
    /// Sum of line nets.
    pub net: Decimal,
    /// Sum of line taxes.
    pub tax: Decimal,
    /// Sum of line grosses.
    pub gross: Decimal,
}

/// Document-level totals.
///
/// Consumed by the rendering layer as-is; never recomputed there.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of line nets.
    pub net: Decimal,
    /// Sum of line taxes.
    pub tax: Decimal,
    /// Sum of line grosses.
    pub gross: Decimal,
    /// Subtotals per tax rate.
    pub tax_buckets: BTreeMap<TaxRate, TaxBucket>,
}

/// A line of a sales document.
///
/// Pricing fields are a snapshot taken when the line was created; they never
/// follow later changes to the item master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDocumentLine {
    /// Identifier.
    pub id: SalesDocumentLineId,
    /// 1-based position within the document.
    pub position: u32,
    /// Item the line was created from, if any.
    pub item_id: Option<ItemId>,
    /// Free-text description owned by the line.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Net unit price.
    pub unit_price_net: Decimal,
    /// Whether a discount may apply.
    pub is_discountable: bool,
    /// Discount in percent (`0..=100`).
    pub discount_percent: Decimal,
    /// Effective tax rate resolved at creation.
    pub tax_rate: TaxRate,
    /// Computed line totals.
    pub totals: LineTotals,
}

/// Input for adding a line to a document by hand.
#[derive(Debug, Clone)]
pub struct NewDocumentLine {
    /// Item reference, if any.
    pub item_id: Option<ItemId>,
    /// Description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Net unit price.
    pub unit_price_net: Decimal,
    /// Whether a discount may apply.
    pub is_discountable: bool,
    /// Discount in percent.
    pub discount_percent: Decimal,
    /// Effective tax rate.
    pub tax_rate: TaxRate,
}

impl SalesDocumentLine {
    /// Builds a line at `position` and computes its totals.
    ///
    /// # Errors
    ///
    /// Returns a calculation error for invalid quantity, price or discount.
    pub fn build(position: u32, input: NewDocumentLine) -> Result<Self, DocumentError> {
        let discount_percent = if input.is_discountable {
            input.discount_percent
        } else {
            Decimal::ZERO
        };
        let totals = LineCalculator::compute_line(
            input.quantity,
            input.unit_price_net,
            discount_percent,
            input.tax_rate,
        )?;

        Ok(Self {
            id: SalesDocumentLineId::new(),
            position,
            item_id: input.item_id,
            description: input.description,
            quantity: input.quantity,
            unit_price_net: input.unit_price_net,
            is_discountable: input.is_discountable,
            discount_percent,
            tax_rate: input.tax_rate,
            totals,
        })
    }

    /// Recomputes the totals from the stored fields.
    ///
    /// # Errors
    ///
    /// Returns a calculation error for invalid stored values.
    pub fn recalculate(&mut self) -> Result<(), DocumentError> {
        self.totals = LineCalculator::compute_line(
            self.quantity,
            self.unit_price_net,
            self.discount_percent,
            self.tax_rate,
        )?;
        Ok(())
    }
}

/// A financial document (invoice, credit note, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDocument {
    /// Identifier.
    pub id: SalesDocumentId,
    /// Document number; allocated when the document is persisted.
    pub number: Option<String>,
    /// Document type.
    pub document_type: DocumentType,
    /// Status.
    pub status: DocumentStatus,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Customer.
    pub customer_id: CustomerId,
    /// Payment term, if any.
    pub payment_term_id: Option<PaymentTermId>,
    /// Currency.
    pub currency: Currency,
    /// Header text.
    pub header_text: Option<String>,
    /// Footer text (includes the payment sentence).
    pub footer_text: Option<String>,
    /// Contract that produced this document, if generated.
    pub contract_id: Option<ContractId>,
    /// First day of the billed period, if generated.
    pub period_start: Option<NaiveDate>,
    /// Last day of the billed period, if generated.
    pub period_end: Option<NaiveDate>,
    /// Lines ordered by position.
    pub lines: Vec<SalesDocumentLine>,
    /// Totals derived from the lines.
    pub totals: DocumentTotals,
}

impl SalesDocument {
    /// Creates an empty draft document due on its issue date.
    #[must_use]
    pub fn new(
        document_type: DocumentType,
        customer_id: CustomerId,
        currency: Currency,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            id: SalesDocumentId::new(),
            number: None,
            document_type,
            status: DocumentStatus::Draft,
            issue_date,
            due_date: issue_date,
            customer_id,
            payment_term_id: None,
            currency,
            header_text: None,
            footer_text: None,
            contract_id: None,
            period_start: None,
            period_end: None,
            lines: Vec::new(),
            totals: DocumentTotals::default(),
        }
    }

    /// Appends a line and refreshes the totals.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` outside draft, or a calculation error.
    pub fn add_line(
        &mut self,
        input: NewDocumentLine,
    ) -> Result<&SalesDocumentLine, DocumentError> {
        self.ensure_editable()?;
        let position = self.next_position();
        let line = SalesDocumentLine::build(position, input)?;
        self.push_line(line)?;
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Appends an already computed line, keeping positions sequential.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` outside draft or an overflow error.
    pub fn push_line(&mut self, mut line: SalesDocumentLine) -> Result<(), DocumentError> {
        self.ensure_editable()?;
        line.position = self.next_position();
        self.lines.push(line);
        self.totals = LineCalculator::aggregate(&self.lines)?;
        Ok(())
    }

    /// Removes the line at `position` and renumbers the rest.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` outside draft or `LineNotFound`.
    pub fn remove_line(&mut self, position: u32) -> Result<SalesDocumentLine, DocumentError> {
        self.ensure_editable()?;
        let index = self
            .lines
            .iter()
            .position(|l| l.position == position)
            .ok_or(DocumentError::LineNotFound(position))?;
        let removed = self.lines.remove(index);
        self.renumber();
        self.totals = LineCalculator::aggregate(&self.lines)?;
        Ok(removed)
    }

    /// Recomputes every line and the document totals.
    ///
    /// # Errors
    ///
    /// Returns a calculation error for any invalid line.
    pub fn recalculate(&mut self) -> Result<(), DocumentError> {
        for line in &mut self.lines {
            line.recalculate()?;
        }
        self.totals = LineCalculator::aggregate(&self.lines)?;
        Ok(())
    }

    /// Issues a draft document.
    ///
    /// # Errors
    ///
    /// Returns `NoLines` for an empty document or an invalid transition.
    pub fn issue(&mut self) -> Result<(), DocumentError> {
        self.transition(DocumentStatus::Issued)?;
        if self.lines.is_empty() {
            return Err(DocumentError::NoLines);
        }
        self.status = DocumentStatus::Issued;
        Ok(())
    }

    /// Marks an issued document as paid.
    ///
    /// # Errors
    ///
    /// Returns an invalid transition error unless issued.
    pub fn mark_paid(&mut self) -> Result<(), DocumentError> {
        self.transition(DocumentStatus::Paid)?;
        self.status = DocumentStatus::Paid;
        Ok(())
    }

    /// Cancels a draft or issued document.
    ///
    /// # Errors
    ///
    /// Returns an invalid transition error for paid or cancelled documents.
    pub fn cancel(&mut self) -> Result<(), DocumentError> {
        self.transition(DocumentStatus::Cancelled)?;
        self.status = DocumentStatus::Cancelled;
        Ok(())
    }

    fn transition(&self, to: DocumentStatus) -> Result<(), DocumentError> {
        let allowed = matches!(
            (self.status, to),
            (DocumentStatus::Draft, DocumentStatus::Issued | DocumentStatus::Cancelled)
                | (DocumentStatus::Issued, DocumentStatus::Paid | DocumentStatus::Cancelled)
        );
        if allowed {
            Ok(())
        } else {
            Err(DocumentError::InvalidStatusTransition {
                from: self.status,
                to,
            })
        }
    }

    fn ensure_editable(&self) -> Result<(), DocumentError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(DocumentError::NotEditable(self.status))
        }
    }

    fn next_position(&self) -> u32 {
        u32::try_from(self.lines.len()).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    fn renumber(&mut self) {
        for (position, line) in (1u32..).zip(self.lines.iter_mut()) {
            line.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate(percent: Decimal) -> TaxRate {
        TaxRate::from_percent(percent).unwrap()
    }

    fn new_line(quantity: Decimal, price: Decimal, tax: Decimal) -> NewDocumentLine {
        NewDocumentLine {
            item_id: None,
            description: "Service".to_string(),
            quantity,
            unit_price_net: price,
            is_discountable: true,
            discount_percent: Decimal::ZERO,
            tax_rate: rate(tax),
        }
    }

    fn draft() -> SalesDocument {
        SalesDocument::new(
            DocumentType::Invoice,
            CustomerId::new(),
            Currency::Eur,
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        )
    }

    #[test]
    fn test_add_line_updates_totals_and_buckets() {
        let mut doc = draft();
        doc.add_line(new_line(dec!(1), dec!(100.00), dec!(19))).unwrap();
        doc.add_line(new_line(dec!(2), dec!(10.00), dec!(7))).unwrap();

        assert_eq!(doc.lines[0].position, 1);
        assert_eq!(doc.lines[1].position, 2);
        assert_eq!(doc.totals.net, dec!(120.00));
        assert_eq!(doc.totals.tax, dec!(20.40));
        assert_eq!(doc.totals.gross, dec!(140.40));

        let nineteen = &doc.totals.tax_buckets[&rate(dec!(19))];
        assert_eq!(nineteen.net, dec!(100.00));
        assert_eq!(nineteen.tax, dec!(19.00));
        let seven = &doc.totals.tax_buckets[&rate(dec!(7))];
        assert_eq!(seven.net, dec!(20.00));
        assert_eq!(seven.tax, dec!(1.40));
        assert_eq!(seven.gross, dec!(21.40));
    }

    #[test]
    fn test_non_discountable_line_ignores_discount() {
        let mut doc = draft();
        let mut input = new_line(dec!(1), dec!(50), dec!(19));
        input.is_discountable = false;
        input.discount_percent = dec!(10);
        let line = doc.add_line(input).unwrap();
        assert_eq!(line.discount_percent, Decimal::ZERO);
        assert_eq!(line.totals.net, dec!(50.00));
    }

    #[test]
    fn test_remove_line_renumbers() {
        let mut doc = draft();
        doc.add_line(new_line(dec!(1), dec!(1), dec!(19))).unwrap();
        doc.add_line(new_line(dec!(1), dec!(2), dec!(19))).unwrap();
        doc.add_line(new_line(dec!(1), dec!(3), dec!(19))).unwrap();

        let removed = doc.remove_line(2).unwrap();
        assert_eq!(removed.unit_price_net, dec!(2));
        assert_eq!(
            doc.lines.iter().map(|l| l.position).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(doc.totals.net, dec!(4.00));
        assert_eq!(doc.remove_line(9), Err(DocumentError::LineNotFound(9)));
    }

    #[test]
    fn test_issued_document_is_not_editable() {
        let mut doc = draft();
        doc.add_line(new_line(dec!(1), dec!(10), dec!(19))).unwrap();
        doc.issue().unwrap();

        let result = doc.add_line(new_line(dec!(1), dec!(10), dec!(19)));
        assert_eq!(
            result.err(),
            Some(DocumentError::NotEditable(DocumentStatus::Issued))
        );
    }

    #[test]
    fn test_issue_requires_lines() {
        let mut doc = draft();
        assert_eq!(doc.issue(), Err(DocumentError::NoLines));
        assert_eq!(doc.status, DocumentStatus::Draft);
    }

    #[test]
    fn test_status_transitions() {
        let mut doc = draft();
        doc.add_line(new_line(dec!(1), dec!(10), dec!(19))).unwrap();
        assert!(doc.mark_paid().is_err());
        doc.issue().unwrap();
        doc.mark_paid().unwrap();
        assert_eq!(
            doc.cancel(),
            Err(DocumentError::InvalidStatusTransition {
                from: DocumentStatus::Paid,
                to: DocumentStatus::Cancelled,
            })
        );
    }

    #[test]
    fn test_recalculate_after_field_change() {
        let mut doc = draft();
        doc.add_line(new_line(dec!(1), dec!(10), dec!(19))).unwrap();
        doc.lines[0].quantity = dec!(3);
        doc.recalculate().unwrap();
        assert_eq!(doc.totals.net, dec!(30.00));
        assert_eq!(doc.totals.gross, dec!(35.70));
    }

    #[test]
    fn test_status_and_type_parse() {
        assert_eq!(DocumentStatus::parse("ISSUED"), Some(DocumentStatus::Issued));
        assert_eq!(DocumentStatus::parse("unknown"), None);
        assert_eq!(DocumentType::parse("credit_note"), Some(DocumentType::CreditNote));
        assert_eq!(DocumentType::Invoice.to_string(), "invoice");
    }
}
