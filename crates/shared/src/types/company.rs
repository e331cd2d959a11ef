//! Issuing company profile threaded through every engine call.

use serde::{Deserialize, Serialize};

use super::id::CompanyId;
use super::money::Currency;

/// The company that issues documents.
///
/// Passed explicitly to the tax resolver, the invoice generator and the
/// billing runner instead of being looked up ambiently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company identifier.
    pub id: CompanyId,
    /// ISO 3166-1 alpha-2 code of the home tax jurisdiction (e.g. "DE").
    pub home_country_code: String,
    /// Default document currency.
    pub currency: Currency,
    /// Number prefix for invoices (e.g. "RE").
    pub invoice_number_prefix: String,
    /// Number prefix for credit notes (e.g. "GS").
    pub credit_note_number_prefix: String,
    /// Header text used when a contract has none.
    pub default_header_text: Option<String>,
    /// Footer text used when a contract has none.
    pub default_footer_text: Option<String>,
}

impl CompanyProfile {
    /// Creates a profile with default prefixes and no texts.
    #[must_use]
    pub fn new(home_country_code: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(),
            home_country_code: normalize_country_code(&home_country_code.into()),
            currency: Currency::default(),
            invoice_number_prefix: "RE".to_string(),
            credit_note_number_prefix: "GS".to_string(),
            default_header_text: None,
            default_footer_text: None,
        }
    }

    /// Returns true if `country_code` is the home jurisdiction.
    #[must_use]
    pub fn is_home_country(&self, country_code: &str) -> bool {
        normalize_country_code(country_code) == self.home_country_code
    }
}

/// Trims and upper-cases a country code.
#[must_use]
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_country_is_case_insensitive() {
        let company = CompanyProfile::new("de");
        assert_eq!(company.home_country_code, "DE");
        assert!(company.is_home_country("DE"));
        assert!(company.is_home_country(" de "));
        assert!(!company.is_home_country("AT"));
    }
}
