//! Property-based tests for the tax decision table.
//!
//! Every combination of country, EU flag, business flag and VAT id must
//! resolve to either the nominal rate or zero, exactly as the table says.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::resolver::{TaxRateResolver, TaxTreatment};
use super::types::{CustomerTaxProfile, TaxRate};

const HOME: &str = "DE";

fn nominal_rate() -> impl Strategy<Value = TaxRate> {
    (0i64..=2500i64).prop_map(|bp| TaxRate::new(Decimal::new(bp, 4)).unwrap())
}

fn country() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DE".to_string()),
        Just("de".to_string()),
        Just("FR".to_string()),
        Just("AT".to_string()),
        Just("CH".to_string()),
        Just("US".to_string()),
    ]
}

fn vat_id() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("XX123456789".to_string())),
    ]
}

fn customer() -> impl Strategy<Value = CustomerTaxProfile> {
    (country(), any::<bool>(), any::<bool>(), vat_id()).prop_map(
        |(country_code, is_eu, is_business, vat_id)| CustomerTaxProfile {
            country_code,
            is_eu,
            is_business,
            vat_id,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The resolved rate always matches the decision table.
    #[test]
    fn prop_resolver_matches_table(profile in customer(), nominal in nominal_rate()) {
        let result = TaxRateResolver::determine(Some(&profile), nominal, HOME);

        let domestic = profile.country_code.eq_ignore_ascii_case(HOME);
        let has_vat = profile
            .vat_id
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());

        let expected = if domestic {
            (TaxTreatment::Domestic, nominal)
        } else if profile.is_eu && profile.is_business && has_vat {
            (TaxTreatment::ReverseCharge, TaxRate::ZERO)
        } else if profile.is_eu {
            (TaxTreatment::EuConsumer, nominal)
        } else {
            (TaxTreatment::Export, TaxRate::ZERO)
        };

        prop_assert_eq!((result.treatment, result.rate), expected);
    }

    /// The resolver never invents a rate: the result is nominal or zero.
    #[test]
    fn prop_resolver_output_is_nominal_or_zero(profile in customer(), nominal in nominal_rate()) {
        let rate = TaxRateResolver::resolve(Some(&profile), nominal, HOME);
        prop_assert!(rate == nominal || rate == TaxRate::ZERO);
    }

    /// Without a profile the nominal rate is always kept.
    #[test]
    fn prop_missing_profile_keeps_nominal(nominal in nominal_rate()) {
        prop_assert_eq!(TaxRateResolver::resolve(None, nominal, HOME), nominal);
    }
}
