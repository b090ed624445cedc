use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::SkuFinanceError;
use crate::types::{Kg, Rate};
use crate::SkuFinanceResult;

const GRAMS_PER_KG: Decimal = dec!(1000);
pub const DAYS_IN_YEAR: Decimal = dec!(365);

pub fn grams_to_kg(grams: Decimal) -> Kg {
    grams / GRAMS_PER_KG
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `numerator / denominator`, or zero when the denominator is not positive.
/// Used for per-kg conversions where a weight <= 0 must yield 0.
pub fn safe_divide_positive(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Compound a yearly rate series into cumulative multipliers.
///
/// `factors[k] = (1 + rates[0]) × … × (1 + rates[k])`, one entry per year of
/// the horizon. Years past the end of `rates` compound at 0, so a short
/// series holds its last factor flat.
pub fn inflation_factors(rates: &[Rate], years: usize) -> SkuFinanceResult<Vec<Decimal>> {
    let mut factors = Vec::with_capacity(years);
    let mut factor = Decimal::ONE;
    for year in 0..years {
        let rate = rates.get(year).copied().unwrap_or(Decimal::ZERO);
        factor = compound(factor, rate).ok_or_else(|| SkuFinanceError::Overflow {
            context: format!("inflation factor for year {}", year + 1),
        })?;
        factors.push(factor);
    }
    Ok(factors)
}

/// `value × (1 + rate)`, or `None` when it leaves the `Decimal` range.
pub fn compound(value: Decimal, rate: Rate) -> Option<Decimal> {
    Decimal::ONE
        .checked_add(rate)
        .and_then(|step| value.checked_mul(step))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grams_to_kg() {
        assert_eq!(grams_to_kg(dec!(250)), dec!(0.25));
    }

    #[test]
    fn test_safe_divide_zero_denominator() {
        assert_eq!(safe_divide(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_divide(dec!(5), dec!(-2)), dec!(-2.5));
        assert_eq!(safe_divide_positive(dec!(5), dec!(-2)), Decimal::ZERO);
    }

    #[test]
    fn test_inflation_factors_compound() {
        let f = inflation_factors(&[dec!(0), dec!(0.10), dec!(0.10)], 4).unwrap();
        assert_eq!(f, vec![dec!(1), dec!(1.10), dec!(1.21), dec!(1.21)]);
    }

    #[test]
    fn test_inflation_factors_empty_series_is_flat() {
        assert_eq!(inflation_factors(&[], 3).unwrap(), vec![Decimal::ONE; 3]);
    }

    #[test]
    fn test_inflation_factors_overflow_is_an_error() {
        let err = inflation_factors(&[dec!(0.05), Decimal::MAX], 2).unwrap_err();
        assert!(matches!(err, SkuFinanceError::Overflow { .. }));
        assert!(err.to_string().contains("year 2"));
    }
}
