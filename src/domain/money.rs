//! Money stored as integer minor units (two decimal places)

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{DomainError, DomainResult};

const SCALE: u32 = 2;

pub fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    amount
        .round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(100))
        .and_then(|v| v.to_i64())
        .ok_or_else(|| DomainError::Validation(format!("amount {} is out of range", amount)))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_both_ways() {
        let amount = Decimal::from_str("12.50").unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), 1250);
        assert_eq!(from_minor_units(1250), amount);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::from_str("0.005").unwrap()).unwrap(), 1);
        assert_eq!(to_minor_units(Decimal::from_str("-0.005").unwrap()).unwrap(), -1);
    }
}
