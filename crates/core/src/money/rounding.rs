//! Rounding for document amounts.
//!
//! Document amounts use commercial rounding (half away from zero) at two
//! decimal places, which is the convention printed on invoices in the home
//! jurisdiction. Exchange-rate style banker's rounding is not used here.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Number of decimal places for every stored document amount.
pub const MONEY_SCALE: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a value to `decimal_places` using half-away-from-zero.
///
/// The result always carries exactly `decimal_places` of scale, so
/// `round_dp(dec!(100), 2)` displays as `100.00`.
#[must_use]
pub fn round_dp(value: Decimal, decimal_places: u32) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimal_places);
    rounded
}

/// Round a monetary value to [`MONEY_SCALE`] places.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use billrun_core::money::round_money;
///
/// assert_eq!(round_money(dec!(2.345)), dec!(2.35));
/// assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
/// ```
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    round_dp(value, MONEY_SCALE)
}

/// Multiplier left after applying a percentage discount: `1 - percent/100`.
#[must_use]
pub fn discount_factor(discount_percent: Decimal) -> Decimal {
    Decimal::ONE - discount_percent / HUNDRED
}

/// Truncate a message to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((byte_index, _)) => message[..byte_index].to_string(),
        None => message.to_string(),
    }
}
