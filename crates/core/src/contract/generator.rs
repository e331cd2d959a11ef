//! Invoice generation from contract lines.

use std::collections::HashMap;

use chrono::NaiveDate;

use billrun_shared::types::{CompanyProfile, ItemId};

use super::error::BillingError;
use super::interval::IntervalCalculator;
use super::types::{Contract, ContractLine};
use crate::document::{
    DocumentError, DocumentType, ItemMaster, LineDraft, SalesDocument, SnapshotApplier,
};
use crate::payment::PaymentTermCalculator;
use crate::tax::{CustomerTaxProfile, TaxRateResolver, TaxTreatment};

/// Resolved inputs for one generation.
///
/// The runner loads these through the collaborator traits so that
/// generation itself stays free of I/O.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Issuing company.
    pub company: &'a CompanyProfile,
    /// Issue date of the new document (the run's as-of date).
    pub issue_date: NaiveDate,
    /// Customer tax profile, if maintained.
    pub tax_profile: Option<&'a CustomerTaxProfile>,
    /// Items linked by the contract lines.
    pub items: &'a HashMap<ItemId, ItemMaster>,
}

/// Builds invoices from contracts.
pub struct InvoiceGenerator;

impl InvoiceGenerator {
    /// Builds an issued, unnumbered invoice for the contract's current period.
    ///
    /// Lines are copied in position order; each one gets a snapshot of its
    /// item, an effective tax rate from [`TaxRateResolver`] and its totals.
    /// The document covers `next_run_date` up to the day before the next
    /// period starts.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a contract without lines, an
    /// unpriced line, a missing item or tax rate, and a calculation error
    /// for invalid amounts.
    pub fn generate(
        contract: &Contract,
        ctx: &GenerationContext<'_>,
    ) -> Result<SalesDocument, BillingError> {
        let period_start = contract
            .next_run_date
            .ok_or(BillingError::MissingNextRunDate(contract.id))?;
        if contract.lines.is_empty() {
            return Err(DocumentError::NoLines.into());
        }

        let mut document = SalesDocument::new(
            DocumentType::Invoice,
            contract.customer_id,
            contract.currency,
            ctx.issue_date,
        );
        document.contract_id = Some(contract.id);
        document.period_start = Some(period_start);
        document.period_end = Some(IntervalCalculator::period_end(
            period_start,
            contract.interval,
        )?);

        let mut treatment = TaxTreatment::NoProfile;
        for line in contract.lines_in_order() {
            let draft = Self::draft_line(line, ctx.items)?;
            if draft.unit_price_net.is_none() {
                return Err(DocumentError::UnpricedLine {
                    position: line.position,
                }
                .into());
            }
            let nominal = draft.nominal_tax_rate.ok_or(DocumentError::MissingTaxRate {
                position: line.position,
            })?;

            let determination = TaxRateResolver::determine(
                ctx.tax_profile,
                nominal,
                &ctx.company.home_country_code,
            );
            treatment = determination.treatment;

            let computed = draft.materialize(line.position, determination.rate)?;
            document.push_line(computed)?;
        }

        document.header_text = contract
            .header_text
            .clone()
            .or_else(|| ctx.company.default_header_text.clone());

        let mut footer: Vec<String> = Vec::new();
        if let Some(text) = contract
            .footer_text
            .as_ref()
            .or(ctx.company.default_footer_text.as_ref())
        {
            footer.push(text.clone());
        }
        if let Some(note) = treatment.invoice_note() {
            footer.push(note.to_string());
        }
        if let Some(term) = &contract.payment_term {
            term.validate()?;
            document.payment_term_id = Some(term.id);
            document.due_date = PaymentTermCalculator::due_date(term, ctx.issue_date)?;
            footer.push(PaymentTermCalculator::descriptive_text(term, ctx.issue_date)?);
        }
        document.footer_text = (!footer.is_empty()).then(|| footer.join("\n\n"));

        document.issue()?;
        Ok(document)
    }

    /// Resolves the pricing of one contract line.
    ///
    /// The item snapshot comes first; an explicit price or rate on the
    /// contract line overrides it. A line is discountable only when both
    /// the contract line and its item allow it.
    fn draft_line(
        line: &ContractLine,
        items: &HashMap<ItemId, ItemMaster>,
    ) -> Result<LineDraft, DocumentError> {
        let mut draft = LineDraft::new(line.description.clone(), line.quantity);

        if let Some(item_id) = line.item_id {
            let item = items.get(&item_id).ok_or(DocumentError::ItemNotFound {
                position: line.position,
                item_id,
            })?;
            SnapshotApplier::apply_snapshot(&mut draft, item);
        }

        draft.is_discountable &= line.is_discountable;
        draft.discount_percent = line.discount_percent;
        if let Some(price) = line.unit_price {
            draft.unit_price_net = Some(price);
        }
        if let Some(rate) = line.tax_rate {
            draft.nominal_tax_rate = Some(rate);
        }

        Ok(draft)
    }
}
