//! Recurring contract domain types.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billrun_shared::types::{ContractId, ContractLineId, Currency, CustomerId, ItemId};

use super::error::BillingError;
use crate::payment::PaymentTerm;
use crate::tax::TaxRate;

/// Billing interval of a recurring contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingInterval {
    /// Every calendar month.
    Monthly,
    /// Every three months.
    Quarterly,
    /// Every six months.
    SemiAnnual,
    /// Every twelve months.
    Annual,
}

impl BillingInterval {
    /// Number of calendar months per interval.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }

    /// Returns the string representation of the interval.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::SemiAnnual => "SEMI_ANNUAL",
            Self::Annual => "ANNUAL",
        }
    }

    /// Parses an interval from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONTHLY" => Some(Self::Monthly),
            "QUARTERLY" => Some(Self::Quarterly),
            "SEMI_ANNUAL" => Some(Self::SemiAnnual),
            "ANNUAL" => Some(Self::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract lifecycle status.
///
/// Draft → Active → Inactive. Contracts are never deleted once they have
/// produced documents; they are deactivated instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    /// Being set up; never billed.
    Draft,
    /// Billed on schedule.
    Active,
    /// Soft-deactivated.
    Inactive,
}

impl ContractStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billed position on a contract.
///
/// Copied, never referenced, into generated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLine {
    /// Identifier.
    pub id: ContractLineId,
    /// Position on the contract.
    pub position: u32,
    /// Linked item, if any.
    pub item_id: Option<ItemId>,
    /// Description printed on the document line.
    pub description: String,
    /// Quantity per period.
    pub quantity: Decimal,
    /// Negotiated net unit price; overrides the item price when set.
    pub unit_price: Option<Decimal>,
    /// Nominal tax rate; overrides the item rate when set.
    pub tax_rate: Option<TaxRate>,
    /// Whether a discount may apply.
    pub is_discountable: bool,
    /// Discount in percent.
    pub discount_percent: Decimal,
}

impl ContractLine {
    /// Creates a priced line without an item link.
    #[must_use]
    pub fn priced(
        position: u32,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            id: ContractLineId::new(),
            position,
            item_id: None,
            description: description.into(),
            quantity,
            unit_price: Some(unit_price),
            tax_rate: Some(tax_rate),
            is_discountable: true,
            discount_percent: Decimal::ZERO,
        }
    }

    /// Creates a line priced from an item.
    #[must_use]
    pub fn for_item(
        position: u32,
        item_id: ItemId,
        description: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: ContractLineId::new(),
            position,
            item_id: Some(item_id),
            description: description.into(),
            quantity,
            unit_price: None,
            tax_rate: None,
            is_discountable: true,
            discount_percent: Decimal::ZERO,
        }
    }
}

/// A recurring billing agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Identifier.
    pub id: ContractId,
    /// Customer billed by this contract.
    pub customer_id: CustomerId,
    /// Billing interval.
    pub interval: BillingInterval,
    /// First billing date.
    pub start_date: NaiveDate,
    /// Last date covered, if the contract ends.
    pub end_date: Option<NaiveDate>,
    /// Date of the last successful run.
    pub last_run_date: Option<NaiveDate>,
    /// Date of the next run; set while active.
    pub next_run_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: ContractStatus,
    /// Document currency.
    pub currency: Currency,
    /// Payment term applied to generated documents.
    pub payment_term: Option<PaymentTerm>,
    /// Header text for generated documents.
    pub header_text: Option<String>,
    /// Footer text for generated documents.
    pub footer_text: Option<String>,
    /// Billed positions.
    pub lines: Vec<ContractLine>,
}

impl Contract {
    /// Creates a draft contract without lines.
    #[must_use]
    pub fn new(
        customer_id: CustomerId,
        interval: BillingInterval,
        start_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        Self {
            id: ContractId::new(),
            customer_id,
            interval,
            start_date,
            end_date: None,
            last_run_date: None,
            next_run_date: None,
            status: ContractStatus::Draft,
            currency,
            payment_term: None,
            header_text: None,
            footer_text: None,
            lines: Vec::new(),
        }
    }

    /// Returns true when the contract is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    /// Selection predicate of a billing run.
    ///
    /// Active, `next_run_date <= as_of`, and `end_date` unset or not before
    /// `next_run_date`.
    #[must_use]
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        let Some(next_run) = self.next_run_date else {
            return false;
        };
        self.is_active()
            && next_run <= as_of
            && self.end_date.is_none_or(|end| end >= next_run)
    }

    /// Activates a draft contract.
    ///
    /// Sets `next_run_date` to the start date when it is not set yet.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the contract has no lines or is
    /// not a draft.
    pub fn activate(&mut self) -> Result<(), BillingError> {
        if self.status != ContractStatus::Draft {
            return Err(BillingError::InvalidContractState {
                contract_id: self.id,
                status: self.status,
            });
        }
        if self.lines.is_empty() {
            return Err(BillingError::Document(
                crate::document::DocumentError::NoLines,
            ));
        }
        if self.next_run_date.is_none() {
            self.next_run_date = Some(self.start_date);
        }
        self.status = ContractStatus::Active;
        Ok(())
    }

    /// Soft-deactivates the contract; it is no longer selected.
    pub fn deactivate(&mut self) {
        self.status = ContractStatus::Inactive;
    }

    /// Adds a line and keeps lines ordered by position.
    pub fn add_line(&mut self, line: ContractLine) {
        self.lines.push(line);
        self.lines.sort_by_key(|l| l.position);
    }

    /// Lines in position order.
    #[must_use]
    pub fn lines_in_order(&self) -> Vec<&ContractLine> {
        let mut lines: Vec<&ContractLine> = self.lines.iter().collect();
        lines.sort_by_key(|l| l.position);
        lines
    }
}
