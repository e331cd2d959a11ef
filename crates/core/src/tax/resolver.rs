//! Tax rate determination for domestic, EU and export customers.
//!
//! The decision table is evaluated top to bottom and the first match wins:
//!
//! | # | Condition                                   | Effective rate |
//! |---|---------------------------------------------|----------------|
//! | 1 | no customer profile                         | nominal        |
//! | 2 | customer country == home country            | nominal        |
//! | 3 | EU and business and VAT id present          | 0 %            |
//! | 4 | EU, rule 3 not met                          | nominal        |
//! | 5 | outside the EU                              | 0 %            |
//!
//! Rule 4 charges EU consumers the nominal rate. This is a simplification:
//! destination-country consumer rates are not modelled.

use serde::{Deserialize, Serialize};

use super::types::{CustomerTaxProfile, TaxRate};

/// Which row of the decision table applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    /// No profile available; the nominal rate is kept.
    NoProfile,
    /// Customer in the home country.
    Domestic,
    /// EU business with VAT id; the buyer accounts for VAT.
    ReverseCharge,
    /// EU customer without reverse-charge eligibility.
    EuConsumer,
    /// Customer outside the EU.
    Export,
}

impl TaxTreatment {
    /// Returns the string representation of the treatment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoProfile => "no_profile",
            Self::Domestic => "domestic",
            Self::ReverseCharge => "reverse_charge",
            Self::EuConsumer => "eu_consumer",
            Self::Export => "export",
        }
    }

    /// Legal note printed on documents taxed at 0 % under this treatment.
    #[must_use]
    pub fn invoice_note(self) -> Option<&'static str> {
        match self {
            Self::ReverseCharge => Some("Reverse charge: VAT is payable by the recipient."),
            Self::Export => Some("Tax-exempt export delivery to a third country."),
            Self::NoProfile | Self::Domestic | Self::EuConsumer => None,
        }
    }
}

/// Effective rate together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxDetermination {
    /// The rate to store on the document line.
    pub rate: TaxRate,
    /// The applied rule.
    pub treatment: TaxTreatment,
}

/// Stateless tax rate resolver.
pub struct TaxRateResolver;

impl TaxRateResolver {
    /// Resolve the effective rate for a customer.
    ///
    /// A missing profile is not an error; it falls back to `nominal_rate`.
    #[must_use]
    pub fn resolve(
        profile: Option<&CustomerTaxProfile>,
        nominal_rate: TaxRate,
        home_country_code: &str,
    ) -> TaxRate {
        Self::determine(profile, nominal_rate, home_country_code).rate
    }

    /// Resolve the effective rate and report which rule applied.
    #[must_use]
    pub fn determine(
        profile: Option<&CustomerTaxProfile>,
        nominal_rate: TaxRate,
        home_country_code: &str,
    ) -> TaxDetermination {
        let treatment = match profile {
            None => TaxTreatment::NoProfile,
            Some(p) if same_country(&p.country_code, home_country_code) => TaxTreatment::Domestic,
            Some(p) if p.is_eu && p.is_business && p.has_vat_id() => TaxTreatment::ReverseCharge,
            Some(p) if p.is_eu => TaxTreatment::EuConsumer,
            Some(_) => TaxTreatment::Export,
        };

        let rate = match treatment {
            TaxTreatment::NoProfile | TaxTreatment::Domestic | TaxTreatment::EuConsumer => {
                nominal_rate
            }
            TaxTreatment::ReverseCharge | TaxTreatment::Export => TaxRate::ZERO,
        };

        TaxDetermination { rate, treatment }
    }
}

fn same_country(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
