//! Fixed-point money arithmetic and rounding primitives.
//!
//! Everything above this module computes with `Decimal`; binary floating
//! point never touches an amount.

pub mod rounding;

#[cfg(test)]
mod props;

pub use rounding::{MONEY_SCALE, discount_factor, round_dp, round_money, truncate_chars};
