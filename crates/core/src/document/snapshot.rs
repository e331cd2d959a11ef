//! Item snapshots for document lines.
//!
//! A line copies the pricing attributes of its item when it is created.
//! The copy is by value: later edits to the item never reach the line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billrun_shared::types::ItemId;

use super::error::DocumentError;
use super::types::{NewDocumentLine, SalesDocumentLine};
use crate::tax::TaxRate;

/// Item master record, read-only for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMaster {
    /// Identifier.
    pub id: ItemId,
    /// Item name; never copied onto lines.
    pub name: String,
    /// Nominal net price.
    pub net_price: Decimal,
    /// Nominal tax rate before any determination rule.
    pub tax_rate: TaxRate,
    /// Whether discounts may apply.
    pub is_discountable: bool,
    /// Cost center; not present on document lines.
    pub cost_center: Option<String>,
}

/// A line that has not been persisted yet.
///
/// Fields left `None` are filled by [`SnapshotApplier::apply_snapshot`] or
/// must be supplied explicitly before [`LineDraft::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    /// Item reference.
    pub item_id: Option<ItemId>,
    /// Description owned by the line.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Net unit price.
    pub unit_price_net: Option<Decimal>,
    /// Whether a discount may apply.
    pub is_discountable: bool,
    /// Requested discount in percent.
    pub discount_percent: Decimal,
    /// Nominal tax rate, input to the tax resolver.
    pub nominal_tax_rate: Option<TaxRate>,
}

impl LineDraft {
    /// Creates a draft with only quantity and description.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            item_id: None,
            description: description.into(),
            quantity,
            unit_price_net: None,
            is_discountable: true,
            discount_percent: Decimal::ZERO,
            nominal_tax_rate: None,
        }
    }

    /// Turns the draft into a computed line at `position`, stored with the
    /// effective (resolved) tax rate.
    ///
    /// # Errors
    ///
    /// Returns `UnpricedLine` when no price was set, or a calculation error.
    pub fn materialize(
        self,
        position: u32,
        effective_tax_rate: TaxRate,
    ) -> Result<SalesDocumentLine, DocumentError> {
        let unit_price_net = self
            .unit_price_net
            .ok_or(DocumentError::UnpricedLine { position })?;

        SalesDocumentLine::build(
            position,
            NewDocumentLine {
                item_id: self.item_id,
                description: self.description,
                quantity: self.quantity,
                unit_price_net,
                is_discountable: self.is_discountable,
                discount_percent: self.discount_percent,
                tax_rate: effective_tax_rate,
            },
        )
    }
}

/// Copies item attributes onto a draft line.
pub struct SnapshotApplier;

impl SnapshotApplier {
    /// Copy the item's price, discountable flag and nominal rate onto `line`.
    ///
    /// The description and cost center are not copied. Returns the nominal
    /// rate, which the caller passes to the tax resolver; only the resolved
    /// rate is stored on the final line.
    pub fn apply_snapshot(line: &mut LineDraft, item: &ItemMaster) -> TaxRate {
        line.item_id = Some(item.id);
        line.unit_price_net = Some(item.net_price);
        line.is_discountable = item.is_discountable;
        line.nominal_tax_rate = Some(item.tax_rate);
        item.tax_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item() -> ItemMaster {
        ItemMaster {
            id: ItemId::new(),
            name: "Excavator rental".to_string(),
            net_price: dec!(250.00),
            tax_rate: TaxRate::from_percent(dec!(19)).unwrap(),
            is_discountable: false,
            cost_center: Some("4000".to_string()),
        }
    }

    #[test]
    fn test_snapshot_copies_pricing_only() {
        let item = item();
        let mut draft = LineDraft::new("Monthly rental", dec!(2));
        let nominal = SnapshotApplier::apply_snapshot(&mut draft, &item);

        assert_eq!(nominal, item.tax_rate);
        assert_eq!(draft.item_id, Some(item.id));
        assert_eq!(draft.unit_price_net, Some(dec!(250.00)));
        assert!(!draft.is_discountable);
        assert_eq!(draft.description, "Monthly rental");
    }

    #[test]
    fn test_line_is_independent_of_item_changes() {
        let mut item = item();
        let mut draft = LineDraft::new("Monthly rental", dec!(1));
        SnapshotApplier::apply_snapshot(&mut draft, &item);
        let line = draft
            .materialize(1, TaxRate::from_percent(dec!(19)).unwrap())
            .unwrap();

        item.net_price = dec!(999.99);
        item.tax_rate = TaxRate::from_percent(dec!(7)).unwrap();
        item.is_discountable = true;

        assert_eq!(line.unit_price_net, dec!(250.00));
        assert_eq!(line.tax_rate, TaxRate::from_percent(dec!(19)).unwrap());
        assert!(!line.is_discountable);
        assert_eq!(line.totals.net, dec!(250.00));
    }

    #[test]
    fn test_materialize_stores_effective_rate() {
        let mut draft = LineDraft::new("Export", dec!(1));
        SnapshotApplier::apply_snapshot(&mut draft, &item());
        let line = draft.materialize(4, TaxRate::ZERO).unwrap();
        assert_eq!(line.position, 4);
        assert_eq!(line.tax_rate, TaxRate::ZERO);
        assert_eq!(line.totals.tax, dec!(0.00));
        assert_eq!(line.totals.gross, dec!(250.00));
    }

    #[test]
    fn test_materialize_without_price_fails() {
        let draft = LineDraft::new("Free text", dec!(1));
        assert_eq!(
            draft.materialize(2, TaxRate::ZERO),
            Err(DocumentError::UnpricedLine { position: 2 })
        );
    }
}
