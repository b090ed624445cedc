use rust_decimal::Decimal;

use crate::business_case::FinanceAssumptions;
use crate::config::EngineConfig;
use crate::types::Rate;

/// Discount rate for the case.
///
/// An explicit override wins. With no build-up input at all the configured
/// default applies; otherwise
/// `WACC = d × Kd × (1 − t) + (1 − d) × Ke`, unset components read as 0 and
/// the tax rate as the configured default.
pub fn resolve_wacc(finance: &FinanceAssumptions, config: &EngineConfig) -> Rate {
    if let Some(w) = finance.wacc_override {
        return w;
    }
    if finance.is_unset() {
        return config.default_wacc;
    }

    let d = finance.debt_share.unwrap_or(Decimal::ZERO);
    let kd = finance.cost_of_debt.unwrap_or(Decimal::ZERO);
    let ke = finance.cost_of_equity.unwrap_or(Decimal::ZERO);
    let t = finance.tax_rate.unwrap_or(config.default_tax_rate);

    d * kd * (Decimal::ONE - t) + (Decimal::ONE - d) * ke
}
