//! Weighed-price arithmetic using rust_decimal for precision
//!
//! Prices are integer currency units; weights are exact decimals parsed from
//! the scale's JSON text, so no binary floating point is involved.

use rust_decimal::prelude::*;

/// Currency has no minor unit on the terminal
const DECIMAL_PLACES: u32 = 0;

const GRAMS_PER_KG: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Round half-up (away from zero) to whole currency units
#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `round_half_up(price_per_kg × weight_kg)`
///
/// Returns `None` when the product does not fit the currency range.
pub fn weighed_price(price_per_kg: i64, weight_kg: Decimal) -> Option<i64> {
    let total = Decimal::from(price_per_kg).checked_mul(weight_kg)?;
    round_money(total).to_i64()
}

/// Kilograms to grams, trailing zeros removed (0.350 kg -> 350 g)
pub fn grams(weight_kg: Decimal) -> Decimal {
    (weight_kg * GRAMS_PER_KG).normalize()
}
