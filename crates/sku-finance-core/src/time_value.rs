use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::SkuFinanceError;
use crate::types::{Money, Rate, Years};
use crate::SkuFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of cash flows (index 0 undiscounted)
pub fn npv(rate: Rate, cash_flows: &[Money]) -> SkuFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(SkuFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    for (t, cf) in cash_flows.iter().enumerate() {
        result += cf * discount_factor(rate, t as u32)?;
    }

    Ok(result)
}

/// `1 / (1 + rate)^year`
pub fn discount_factor(rate: Rate, year: u32) -> SkuFinanceResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(SkuFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let growth = (Decimal::ONE + rate)
        .checked_powi(i64::from(year))
        .ok_or_else(|| SkuFinanceError::Overflow {
            context: format!("discount factor at year {year}"),
        })?;
    Decimal::ONE
        .checked_div(growth)
        .ok_or_else(|| SkuFinanceError::DivisionByZero {
            context: format!("discount factor at year {year}"),
        })
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Returns `None` when the rate is undefined: fewer than two flows, a flat
/// derivative, an iterate at or below -100%, decimal overflow, or no
/// convergence within the iteration cap. Callers must not read `None` as 0.
pub fn irr(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let mut rate = guess;

    for _ in 0..MAX_IRR_ITERATIONS {
        let (value, derivative) = npv_with_derivative(rate, cash_flows)?;
        if derivative.is_zero() {
            return None;
        }

        let step = value.checked_div(derivative)?;
        let next = rate.checked_sub(step)?;
        if next <= dec!(-1) {
            return None;
        }
        if step.abs() < CONVERGENCE_THRESHOLD {
            return Some(next);
        }
        rate = next;
    }

    None
}

/// NPV and its first derivative with respect to the rate, using checked
/// arithmetic throughout so a runaway iterate surfaces as `None`.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut compound = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            compound = compound.checked_mul(one_plus_r)?;
        }
        value = value.checked_add(cf.checked_div(compound)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as u64);
            let term = t_dec
                .checked_mul(*cf)?
                .checked_div(compound.checked_mul(one_plus_r)?)?;
            derivative = derivative.checked_sub(term)?;
        }
    }

    Some((value, derivative))
}

/// Fractional payback period.
///
/// Scans the cumulative sum of `cash_flows` (index 0 = year 0) for the first
/// year `k` where it turns from negative to non-negative and interpolates
/// `(k - 1) + |cumulative[k-1]| / cash_flows[k]`. Returns `Some(0)` when the
/// year-0 position is already non-negative and `None` when the cumulative
/// position never recovers.
pub fn payback_period(cash_flows: &[Money]) -> Option<Years> {
    let first = *cash_flows.first()?;
    if first >= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let mut cumulative = first;
    for (k, cf) in cash_flows.iter().enumerate().skip(1) {
        let previous = cumulative;
        cumulative += cf;
        if previous < Decimal::ZERO && cumulative >= Decimal::ZERO {
            // cf > 0 here: the sign flipped upward.
            let fraction = previous.abs() / cf;
            return Some(Decimal::from((k - 1) as u64) + fraction);
        }
    }

    None
}
