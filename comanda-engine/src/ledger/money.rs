//! Money helpers for running-total maintenance
//!
//! All arithmetic is `Decimal`; totals are normalized to two decimal
//! places with half-up rounding whenever they are written back.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary values round to 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Normalize a monetary amount to cent precision
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Contribution of a line: quantity × unit price, normalized
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round2(unit_price * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("10")), dec("10.00"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("10.00"), 3), dec("30.00"));
        assert_eq!(line_total(dec("0.35"), 4), dec("1.40"));
    }
}
