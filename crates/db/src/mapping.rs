//! Conversions between database rows and engine types.
//!
//! Rows that cannot be represented in the domain (unknown status strings,
//! negative positions, out-of-range rates) surface as
//! [`StoreError::InvalidData`] instead of being silently coerced.

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::Set;

use billrun_core::contract::{
    BillingInterval, Contract, ContractLine, ContractRun, ContractStatus, NewContractRun,
    RunOutcome, StoreError,
};
use billrun_core::document::{
    DocumentStatus, DocumentType, ItemMaster, LineCalculator, LineTotals, SalesDocument,
    SalesDocumentLine,
};
use billrun_core::payment::PaymentTerm;
use billrun_core::tax::{CustomerTaxProfile, TaxRate};
use billrun_shared::types::{
    ContractId, ContractLineId, ContractRunId, Currency, CustomerId, ItemId, PaymentTermId,
    SalesDocumentId, SalesDocumentLineId,
};

use crate::entities::{
    contract_lines, contract_runs, contracts, customers, items, payment_terms,
    sales_document_lines, sales_documents,
};

fn invalid(what: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(what.to_string())
}

fn to_u32(value: i32, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| invalid(format!("{field} must not be negative, got {value}")))
}

fn to_i32(value: u32, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| invalid(format!("{field} out of range: {value}")))
}

fn tax_rate(fraction: Decimal) -> Result<TaxRate, StoreError> {
    TaxRate::new(fraction).map_err(invalid)
}

fn currency(code: &str) -> Result<Currency, StoreError> {
    Currency::from_str(code.trim()).map_err(invalid)
}

/// Maps a payment term row.
///
/// # Errors
///
/// Returns `InvalidData` for negative day counts.
pub fn payment_term_from_row(row: payment_terms::Model) -> Result<PaymentTerm, StoreError> {
    Ok(PaymentTerm {
        id: PaymentTermId::from_uuid(row.id),
        name: row.name,
        net_days: to_u32(row.net_days, "net_days")?,
        discount_days: row
            .discount_days
            .map(|days| to_u32(days, "discount_days"))
            .transpose()?,
        discount_rate: row.discount_rate,
    })
}

/// Maps a customer row to its tax profile.
///
/// Customers without a country have no profile.
#[must_use]
pub fn tax_profile_from_row(row: customers::Model) -> Option<CustomerTaxProfile> {
    let country_code = row.country_code?;
    Some(CustomerTaxProfile {
        country_code: country_code.trim().to_uppercase(),
        is_eu: row.is_eu,
        is_business: row.is_business,
        vat_id: row.vat_id,
    })
}

/// Maps an item row.
///
/// # Errors
///
/// Returns `InvalidData` for a tax rate outside `0..=1`.
pub fn item_from_row(row: items::Model) -> Result<ItemMaster, StoreError> {
    Ok(ItemMaster {
        id: ItemId::from_uuid(row.id),
        name: row.name,
        net_price: row.net_price,
        tax_rate: tax_rate(row.tax_rate)?,
        is_discountable: row.is_discountable,
        cost_center: row.cost_center,
    })
}

/// Maps a contract line row.
///
/// # Errors
///
/// Returns `InvalidData` for a negative position or an invalid tax rate.
pub fn contract_line_from_row(row: contract_lines::Model) -> Result<ContractLine, StoreError> {
    Ok(ContractLine {
        id: ContractLineId::from_uuid(row.id),
        position: to_u32(row.position, "position")?,
        item_id: row.item_id.map(ItemId::from_uuid),
        description: row.description,
        quantity: row.quantity,
        unit_price: row.unit_price,
        tax_rate: row.tax_rate.map(tax_rate).transpose()?,
        is_discountable: row.is_discountable,
        discount_percent: row.discount_percent,
    })
}

/// Assembles a contract from its row, lines and payment term.
///
/// # Errors
///
/// Returns `InvalidData` for unknown interval, status or currency values.
pub fn contract_from_rows(
    row: contracts::Model,
    lines: Vec<contract_lines::Model>,
    payment_term: Option<payment_terms::Model>,
) -> Result<Contract, StoreError> {
    let interval = BillingInterval::parse(&row.billing_interval)
        .ok_or_else(|| invalid(format!("unknown billing interval {}", row.billing_interval)))?;
    let status = ContractStatus::parse(&row.status)
        .ok_or_else(|| invalid(format!("unknown contract status {}", row.status)))?;

    let mut lines = lines
        .into_iter()
        .map(contract_line_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|line| line.position);

    Ok(Contract {
        id: ContractId::from_uuid(row.id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        interval,
        start_date: row.start_date,
        end_date: row.end_date,
        last_run_date: row.last_run_date,
        next_run_date: row.next_run_date,
        status,
        currency: currency(&row.currency)?,
        payment_term: payment_term.map(payment_term_from_row).transpose()?,
        header_text: row.header_text,
        footer_text: row.footer_text,
        lines,
    })
}

/// Maps a ledger row.
///
/// # Errors
///
/// Returns `InvalidData` for an unknown outcome.
pub fn run_from_row(row: contract_runs::Model) -> Result<ContractRun, StoreError> {
    let outcome = RunOutcome::parse(&row.outcome)
        .ok_or_else(|| invalid(format!("unknown run outcome {}", row.outcome)))?;
    Ok(ContractRun {
        id: ContractRunId::from_uuid(row.id),
        contract_id: ContractId::from_uuid(row.contract_id),
        run_at: row.run_at.with_timezone(&Utc),
        period_date: row.period_date,
        outcome,
        document_id: row.document_id.map(SalesDocumentId::from_uuid),
        error_code: row.error_code,
        error_message: row.error_message,
    })
}

/// Builds the insert model for a new ledger entry.
#[must_use]
pub fn run_active_model(id: ContractRunId, run: &NewContractRun) -> contract_runs::ActiveModel {
    contract_runs::ActiveModel {
        id: Set(id.into_inner()),
        contract_id: Set(run.contract_id.into_inner()),
        run_at: Set(run.run_at.into()),
        period_date: Set(run.period_date),
        outcome: Set(run.outcome.as_str().to_string()),
        document_id: Set(run.document_id.map(SalesDocumentId::into_inner)),
        error_code: Set(run.error_code.clone()),
        error_message: Set(run.error_message.clone()),
    }
}

/// Builds the insert model for a document header.
///
/// The document number must already be allocated.
#[must_use]
pub fn document_active_model(document: &SalesDocument) -> sales_documents::ActiveModel {
    sales_documents::ActiveModel {
        id: Set(document.id.into_inner()),
        number: Set(document.number.clone()),
        document_type: Set(document.document_type.as_str().to_string()),
        status: Set(document.status.as_str().to_string()),
        issue_date: Set(document.issue_date),
        due_date: Set(document.due_date),
        customer_id: Set(document.customer_id.into_inner()),
        payment_term_id: Set(document.payment_term_id.map(PaymentTermId::into_inner)),
        currency: Set(document.currency.code().to_string()),
        header_text: Set(document.header_text.clone()),
        footer_text: Set(document.footer_text.clone()),
        contract_id: Set(document.contract_id.map(ContractId::into_inner)),
        period_start: Set(document.period_start),
        period_end: Set(document.period_end),
        net_total: Set(document.totals.net),
        tax_total: Set(document.totals.tax),
        gross_total: Set(document.totals.gross),
        ..Default::default()
    }
}

/// Builds the insert model for a document line.
///
/// # Errors
///
/// Returns `InvalidData` for a position beyond `i32::MAX`.
pub fn document_line_active_model(
    document_id: SalesDocumentId,
    line: &SalesDocumentLine,
) -> Result<sales_document_lines::ActiveModel, StoreError> {
    Ok(sales_document_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        document_id: Set(document_id.into_inner()),
        position: Set(to_i32(line.position, "position")?),
        item_id: Set(line.item_id.map(ItemId::into_inner)),
        description: Set(line.description.clone()),
        quantity: Set(line.quantity),
        unit_price_net: Set(line.unit_price_net),
        is_discountable: Set(line.is_discountable),
        discount_percent: Set(line.discount_percent),
        tax_rate: Set(line.tax_rate.fraction()),
        net: Set(line.totals.net),
        tax: Set(line.totals.tax),
        gross: Set(line.totals.gross),
    })
}

/// Maps a document line row.
///
/// # Errors
///
/// Returns `InvalidData` for a negative position or an invalid tax rate.
pub fn document_line_from_row(
    row: sales_document_lines::Model,
) -> Result<SalesDocumentLine, StoreError> {
    Ok(SalesDocumentLine {
        id: SalesDocumentLineId::from_uuid(row.id),
        position: to_u32(row.position, "position")?,
        item_id: row.item_id.map(ItemId::from_uuid),
        description: row.description,
        quantity: row.quantity,
        unit_price_net: row.unit_price_net,
        is_discountable: row.is_discountable,
        discount_percent: row.discount_percent,
        tax_rate: tax_rate(row.tax_rate)?,
        totals: LineTotals {
            net: row.net,
            tax: row.tax,
            gross: row.gross,
        },
    })
}

/// Assembles a document from its header and line rows.
///
/// Totals and tax buckets are rebuilt from the stored line totals, so a
/// loaded document reports exactly what was issued.
///
/// # Errors
///
/// Returns `InvalidData` for unknown enum values or stored totals that no
/// longer add up.
pub fn document_from_rows(
    row: sales_documents::Model,
    lines: Vec<sales_document_lines::Model>,
) -> Result<SalesDocument, StoreError> {
    let document_type = DocumentType::parse(&row.document_type)
        .ok_or_else(|| invalid(format!("unknown document type {}", row.document_type)))?;
    let status = DocumentStatus::parse(&row.status)
        .ok_or_else(|| invalid(format!("unknown document status {}", row.status)))?;

    let mut lines = lines
        .into_iter()
        .map(document_line_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|line| line.position);

    let totals = LineCalculator::aggregate(&lines).map_err(invalid)?;
    if totals.gross != row.gross_total {
        return Err(invalid(format!(
            "document {} gross total {} does not match its lines ({})",
            row.id, row.gross_total, totals.gross
        )));
    }

    Ok(SalesDocument {
        id: SalesDocumentId::from_uuid(row.id),
        number: row.number,
        document_type,
        status,
        issue_date: row.issue_date,
        due_date: row.due_date,
        customer_id: CustomerId::from_uuid(row.customer_id),
        payment_term_id: row.payment_term_id.map(PaymentTermId::from_uuid),
        currency: currency(&row.currency)?,
        header_text: row.header_text,
        footer_text: row.footer_text,
        contract_id: row.contract_id.map(ContractId::from_uuid),
        period_start: row.period_start,
        period_end: row.period_end,
        lines,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use uuid::Uuid;

    fn timestamp() -> DateTimeWithTimeZone {
        Utc.with_ymd_and_hms(2026, 1, 31, 6, 0, 0).unwrap().into()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract_row() -> contracts::Model {
        contracts::Model {
            id: Uuid::now_v7(),
            customer_id: Uuid::now_v7(),
            billing_interval: "QUARTERLY".to_string(),
            start_date: date(2026, 1, 31),
            end_date: None,
            last_run_date: None,
            next_run_date: Some(date(2026, 1, 31)),
            status: "active".to_string(),
            currency: "EUR".to_string(),
            payment_term_id: None,
            header_text: None,
            footer_text: Some("Thanks".to_string()),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    fn line_row(contract_id: Uuid, position: i32) -> contract_lines::Model {
        contract_lines::Model {
            id: Uuid::now_v7(),
            contract_id,
            position,
            item_id: None,
            description: format!("Line {position}"),
            quantity: dec!(1),
            unit_price: Some(dec!(100)),
            tax_rate: Some(dec!(0.19)),
            is_discountable: true,
            discount_percent: dec!(0),
        }
    }

    #[test]
    fn test_contract_lines_are_ordered_by_position() {
        let row = contract_row();
        let lines = vec![line_row(row.id, 2), line_row(row.id, 1)];

        let contract = contract_from_rows(row, lines, None).unwrap();
        assert_eq!(contract.interval, BillingInterval::Quarterly);
        assert_eq!(contract.status, ContractStatus::Active);
        let positions: Vec<u32> = contract.lines.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(contract.lines[0].tax_rate, Some(TaxRate::new(dec!(0.19)).unwrap()));
    }

    #[test]
    fn test_unknown_interval_is_invalid_data() {
        let mut row = contract_row();
        row.billing_interval = "WEEKLY".to_string();
        let result = contract_from_rows(row, Vec::new(), None);
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_negative_line_position_is_invalid_data() {
        let row = contract_row();
        let lines = vec![line_row(row.id, -1)];
        assert!(matches!(
            contract_from_rows(row, lines, None),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_customer_without_country_has_no_profile() {
        let row = customers::Model {
            id: Uuid::now_v7(),
            name: "Acme".to_string(),
            country_code: None,
            is_eu: false,
            is_business: true,
            vat_id: None,
            created_at: timestamp(),
            updated_at: timestamp(),
        };
        assert_eq!(tax_profile_from_row(row.clone()), None);

        let row = customers::Model {
            country_code: Some("at".to_string()),
            is_eu: true,
            vat_id: Some("ATU12345678".to_string()),
            ..row
        };
        let profile = tax_profile_from_row(row).unwrap();
        assert_eq!(profile.country_code, "AT");
        assert!(profile.has_vat_id());
    }

    #[test]
    fn test_payment_term_days_map_to_unsigned() {
        let row = payment_terms::Model {
            id: Uuid::now_v7(),
            name: "10 days 2% / 14 days net".to_string(),
            net_days: 14,
            discount_days: Some(10),
            discount_rate: Some(dec!(0.02)),
            created_at: timestamp(),
        };
        let term = payment_term_from_row(row.clone()).unwrap();
        assert_eq!(term.discount(), Some((10, dec!(0.02))));

        let negative = payment_terms::Model {
            net_days: -3,
            ..row
        };
        assert!(matches!(
            payment_term_from_row(negative),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_item_with_rate_above_one_is_invalid_data() {
        let row = items::Model {
            id: Uuid::now_v7(),
            name: "Hosting".to_string(),
            net_price: dec!(50),
            tax_rate: dec!(19),
            is_discountable: true,
            cost_center: None,
            created_at: timestamp(),
            updated_at: timestamp(),
        };
        assert!(matches!(item_from_row(row), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_run_row_maps_outcome_and_time() {
        let row = contract_runs::Model {
            id: Uuid::now_v7(),
            contract_id: Uuid::now_v7(),
            run_at: timestamp(),
            period_date: date(2026, 1, 31),
            outcome: "SKIPPED".to_string(),
            document_id: None,
            error_code: Some("SCHEDULE_CONFLICT".to_string()),
            error_message: Some("already billed".to_string()),
        };
        let run = run_from_row(row).unwrap();
        assert_eq!(run.outcome, RunOutcome::Skipped);
        assert_eq!(run.run_at, Utc.with_ymd_and_hms(2026, 1, 31, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_document_totals_are_rebuilt_from_lines() {
        let document_id = Uuid::now_v7();
        let header = sales_documents::Model {
            id: document_id,
            number: Some("RE-2026-00001".to_string()),
            document_type: "invoice".to_string(),
            status: "issued".to_string(),
            issue_date: date(2026, 1, 31),
            due_date: date(2026, 2, 14),
            customer_id: Uuid::now_v7(),
            payment_term_id: None,
            currency: "EUR".to_string(),
            header_text: None,
            footer_text: None,
            contract_id: Some(Uuid::now_v7()),
            period_start: Some(date(2026, 1, 31)),
            period_end: Some(date(2026, 4, 29)),
            net_total: dec!(150.00),
            tax_total: dec!(23.50),
            gross_total: dec!(173.50),
            created_at: timestamp(),
        };
        let line = |position: i32, net, tax, gross, rate| sales_document_lines::Model {
            id: Uuid::now_v7(),
            document_id,
            position,
            item_id: None,
            description: format!("Line {position}"),
            quantity: dec!(1),
            unit_price_net: net,
            is_discountable: true,
            discount_percent: dec!(0),
            tax_rate: rate,
            net,
            tax,
            gross,
        };
        let lines = vec![
            line(2, dec!(50.00), dec!(4.50), dec!(54.50), dec!(0.09)),
            line(1, dec!(100.00), dec!(19.00), dec!(119.00), dec!(0.19)),
        ];

        let document = document_from_rows(header.clone(), lines.clone()).unwrap();
        assert_eq!(document.lines[0].position, 1);
        assert_eq!(document.totals.gross, dec!(173.50));
        assert_eq!(document.totals.tax_buckets.len(), 2);

        let tampered = sales_documents::Model {
            gross_total: dec!(999.00),
            ..header
        };
        assert!(matches!(
            document_from_rows(tampered, lines),
            Err(StoreError::InvalidData(_))
        ));
    }
}
