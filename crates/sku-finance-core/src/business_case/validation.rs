use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::SkuFinanceError;
use crate::types::Rate;
use crate::SkuFinanceResult;

use super::inputs::{BusinessCase, FinanceAssumptions, Sku};

/// Reject business cases the pipeline cannot compute. Every error names the
/// offending field using the `skus[i].group.field` path syntax.
pub fn validate_business_case(case: &BusinessCase) -> SkuFinanceResult<()> {
    if case.skus.is_empty() {
        return Err(SkuFinanceError::InsufficientData(format!(
            "Business case '{}' has no SKUs",
            case.id
        )));
    }

    let mut seen = HashSet::with_capacity(case.skus.len());
    for (i, sku) in case.skus.iter().enumerate() {
        if sku.id.trim().is_empty() {
            return Err(invalid(format!("skus[{i}].id"), "SKU id must not be empty"));
        }
        if !seen.insert(sku.id.as_str()) {
            return Err(invalid(
                format!("skus[{i}].id"),
                &format!("Duplicate SKU id '{}'", sku.id),
            ));
        }
        validate_sku(i, sku)?;
    }

    validate_finance(&case.finance)
}

fn validate_sku(i: usize, sku: &Sku) -> SkuFinanceResult<()> {
    let field = |name: &str| format!("skus[{i}].{name}");

    // --- Sales ---
    non_negative(field("sales.product_weight_grams"), sku.sales.product_weight_grams)?;
    non_negative(field("sales.base_annual_volume"), sku.sales.base_annual_volume)?;
    fraction(field("sales.sales_discount"), sku.sales.sales_discount)?;
    if let Some(rate) = sku.sales.machine_rate_rs_per_day {
        non_negative(field("sales.machine_rate_rs_per_day"), rate)?;
    }
    if let Some(growth) = sku.sales.yoy_growth {
        compounding_rate(field("sales.yoy_growth"), growth)?;
    }

    // --- NPD ---
    if sku.npd.cavities == 0 {
        return Err(invalid(field("npd.cavities"), "Cavity count must be positive"));
    }
    if sku.npd.cycle_time_seconds <= Decimal::ZERO {
        return Err(invalid(
            field("npd.cycle_time_seconds"),
            "Cycle time must be positive (zero implies infinite throughput)",
        ));
    }

    // --- Ops ---
    fraction(field("ops.oee"), sku.ops.oee)?;
    if let Some(hours) = sku.ops.operating_hours_per_day {
        if hours <= Decimal::ZERO || hours > dec!(24) {
            return Err(invalid(
                field("ops.operating_hours_per_day"),
                "Operating hours must be in (0, 24]",
            ));
        }
    }
    if let Some(days) = sku.ops.working_days_per_year {
        if days <= Decimal::ZERO || days > dec!(366) {
            return Err(invalid(
                field("ops.working_days_per_year"),
                "Working days must be in (0, 366]",
            ));
        }
    }
    if let Some(shifts) = sku.ops.shifts_per_day {
        if shifts <= Decimal::ZERO {
            return Err(invalid(field("ops.shifts_per_day"), "Shifts per day must be positive"));
        }
    }
    non_negative(field("ops.machine_power_kw"), sku.ops.machine_power_kw)?;
    non_negative(field("ops.manpower_per_shift"), sku.ops.manpower_per_shift)?;
    non_negative(field("ops.machine_capex_new"), sku.ops.machine_capex_new)?;
    non_negative(field("ops.machine_value_old"), sku.ops.machine_value_old)?;
    non_negative(field("ops.mould_capex"), sku.ops.mould_capex)?;
    non_negative(field("ops.infra_capex"), sku.ops.infra_capex)?;
    non_negative(field("ops.working_capital_days"), sku.ops.working_capital_days)?;

    // --- Costing ---
    let c = &sku.costing;
    non_negative(field("costing.resin_rs_per_kg"), c.resin_rs_per_kg)?;
    fraction(field("costing.resin_discount"), c.resin_discount)?;
    non_negative(field("costing.freight_in_rs_per_kg"), c.freight_in_rs_per_kg)?;
    non_negative(field("costing.wastage"), c.wastage)?;
    non_negative(field("costing.masterbatch_rs_per_kg"), c.masterbatch_rs_per_kg)?;
    fraction(field("costing.masterbatch_ratio"), c.masterbatch_ratio)?;
    non_negative(field("costing.packaging_rs_per_kg"), c.packaging_rs_per_kg)?;
    non_negative(field("costing.freight_out_rs_per_kg"), c.freight_out_rs_per_kg)?;
    non_negative(field("costing.value_add_rs_per_piece"), c.value_add_rs_per_piece)?;
    for (year, rate) in c.conversion_inflation.iter().enumerate() {
        compounding_rate(field(&format!("costing.conversion_inflation.{year}")), *rate)?;
    }
    for (year, rate) in c.rm_inflation.iter().enumerate() {
        compounding_rate(field(&format!("costing.rm_inflation.{year}")), *rate)?;
    }

    Ok(())
}

fn validate_finance(finance: &FinanceAssumptions) -> SkuFinanceResult<()> {
    if let Some(d) = finance.debt_share {
        fraction("finance.debt_share".into(), d)?;
    }
    if let Some(t) = finance.tax_rate {
        fraction("finance.tax_rate".into(), t)?;
    }
    if let Some(kd) = finance.cost_of_debt {
        non_negative("finance.cost_of_debt".into(), kd)?;
    }
    if let Some(ke) = finance.cost_of_equity {
        non_negative("finance.cost_of_equity".into(), ke)?;
    }
    if let Some(w) = finance.wacc_override {
        above_minus_one("finance.wacc_override".into(), w)?;
    }
    compounding_rate("finance.annual_volume_growth".into(), finance.annual_volume_growth)?;
    if finance.debt_tenor_years == Some(0) {
        return Err(invalid(
            "finance.debt_tenor_years".into(),
            "Debt tenor must be at least one year",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid(field: String, reason: &str) -> SkuFinanceError {
    SkuFinanceError::InvalidInput {
        field,
        reason: reason.into(),
    }
}

fn non_negative(field: String, value: Decimal) -> SkuFinanceResult<()> {
    if value < Decimal::ZERO {
        return Err(invalid(field, "Value cannot be negative"));
    }
    Ok(())
}

fn fraction(field: String, value: Rate) -> SkuFinanceResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(field, "Value must be a fraction between 0 and 1"));
    }
    Ok(())
}

fn above_minus_one(field: String, value: Rate) -> SkuFinanceResult<()> {
    if value <= dec!(-1) {
        return Err(invalid(field, "Rate must be greater than -100%"));
    }
    Ok(())
}

/// Highest yearly growth or inflation rate accepted (1000%).
pub const MAX_COMPOUNDING_RATE: Rate = dec!(10);

/// A rate compounded every year of the horizon.
fn compounding_rate(field: String, value: Rate) -> SkuFinanceResult<()> {
    above_minus_one(field.clone(), value)?;
    if value > MAX_COMPOUNDING_RATE {
        return Err(invalid(field, "Rate must not exceed 1000% per year"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::{sample_case, sample_sku};

    fn field_of(err: SkuFinanceError) -> String {
        match err {
            SkuFinanceError::InvalidInput { field, .. } => field,
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_sample_case_is_valid() {
        assert!(validate_business_case(&sample_case()).is_ok());
    }

    #[test]
    fn test_empty_skus_rejected() {
        let mut case = sample_case();
        case.skus.clear();
        assert!(matches!(
            validate_business_case(&case),
            Err(SkuFinanceError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_duplicate_sku_id_rejected() {
        let mut case = sample_case();
        case.skus.push(sample_sku("SKU-1"));
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[1].id");
    }

    #[test]
    fn test_zero_cycle_time_rejected() {
        let mut case = sample_case();
        case.skus[0].npd.cycle_time_seconds = Decimal::ZERO;
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[0].npd.cycle_time_seconds");
    }

    #[test]
    fn test_oee_above_one_rejected() {
        let mut case = sample_case();
        case.skus[0].ops.oee = dec!(1.2);
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[0].ops.oee");
    }

    #[test]
    fn test_zero_weight_is_legal() {
        let mut case = sample_case();
        case.skus[0].sales.product_weight_grams = Decimal::ZERO;
        assert!(validate_business_case(&case).is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut case = sample_case();
        case.skus[0].sales.product_weight_grams = dec!(-1);
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[0].sales.product_weight_grams");
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        let mut case = sample_case();
        case.finance.tax_rate = Some(dec!(25));
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "finance.tax_rate");
    }

    #[test]
    fn test_runaway_growth_and_inflation_rejected() {
        let mut case = sample_case();
        case.skus[0].sales.yoy_growth = Some(dec!(1000));
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[0].sales.yoy_growth");

        let mut case = sample_case();
        case.skus[0].costing.rm_inflation = vec![dec!(0.05), dec!(10.5)];
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "skus[0].costing.rm_inflation.1");

        let mut case = sample_case();
        case.finance.annual_volume_growth = MAX_COMPOUNDING_RATE;
        assert!(validate_business_case(&case).is_ok());
        case.finance.annual_volume_growth = dec!(10.01);
        let err = validate_business_case(&case).unwrap_err();
        assert_eq!(field_of(err), "finance.annual_volume_growth");
    }
}
