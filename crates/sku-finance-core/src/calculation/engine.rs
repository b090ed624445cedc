use std::time::Instant;

use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregation::{
    aggregate_capex, aggregate_working_capital_days, pnl_per_kg, total_pnl, total_volumes,
    weighted_price_per_kg,
};
use crate::business_case::{validate_business_case, BusinessCase, FinanceAssumptions, Sku};
use crate::config::EngineConfig;
use crate::error::catch_abort;
use crate::projection::{build_pnl, build_prices, sku_capacity, sku_volumes};
use crate::returns::{compute_returns, CapitalBase};
use crate::types::{with_metadata, ComputationOutput};
use crate::SkuFinanceResult;

use super::output::{CalcOutput, SkuOutput};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the full pipeline with the default configuration.
pub fn calculate(case: &BusinessCase) -> SkuFinanceResult<CalcOutput> {
    calculate_with_config(case, &EngineConfig::default())
}

/// Validate the case, project every SKU, then merge them into case totals
/// and case-level returns. Arithmetic that leaves the `Decimal` range is
/// returned as an error, never a panic.
pub fn calculate_with_config(
    case: &BusinessCase,
    config: &EngineConfig,
) -> SkuFinanceResult<CalcOutput> {
    config.validate()?;
    validate_business_case(case)?;
    catch_abort("calculate", || project_case(case, config))
}

fn project_case(case: &BusinessCase, config: &EngineConfig) -> SkuFinanceResult<CalcOutput> {
    let years = config.horizon_years;
    let by_sku = case
        .skus
        .iter()
        .map(|sku| project_sku(sku, &case.finance, config))
        .collect::<SkuFinanceResult<Vec<_>>>()?;

    let sku_volumes: Vec<_> = by_sku.iter().map(|s| s.volumes.clone()).collect();
    let sku_prices: Vec<_> = by_sku.iter().map(|s| s.prices.clone()).collect();
    let sku_pnl: Vec<_> = by_sku.iter().map(|s| s.pnl.clone()).collect();

    let pnl = total_pnl(&sku_pnl, years);
    let capital = CapitalBase {
        initial_capex: aggregate_capex(&case.skus),
        working_capital_days: aggregate_working_capital_days(&case.skus),
    };
    let (cashflow, returns) = compute_returns(&pnl, capital, &case.finance, config)?;

    debug!(
        case_id = %case.id,
        skus = case.skus.len(),
        npv = %returns.npv,
        "business case calculated"
    );

    Ok(CalcOutput {
        case_id: case.id.clone(),
        case_name: case.name.clone(),
        horizon_years: years,
        reporting_years: config.reporting_years,
        volumes: total_volumes(&sku_volumes, years),
        weighted_price_per_kg: weighted_price_per_kg(&sku_volumes, &sku_prices, years),
        pnl_per_kg: pnl_per_kg(&sku_volumes, &sku_pnl, years),
        pnl,
        cashflow,
        returns,
        by_sku,
    })
}

/// [`calculate_with_config`] wrapped in the standard output envelope.
pub fn calculate_case(
    case: &BusinessCase,
    config: &EngineConfig,
) -> SkuFinanceResult<ComputationOutput<CalcOutput>> {
    let start = Instant::now();
    let output = calculate_with_config(case, config)?;
    let warnings = collect_warnings(case, &output);

    let assumptions = serde_json::json!({
        "horizon_years": config.horizon_years,
        "reporting_years": config.reporting_years,
        "skus": case.skus.len(),
        "wacc": output.returns.wacc.to_string(),
        "wacc_source": wacc_source(&case.finance),
        "debt_basis": case.finance.debt_basis,
        "include_corp_sga": case.finance.include_corp_sga,
        "fcf_basis": "ebitda_less_interest_tax_and_nwc_change",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SKU business case: capacity, volume, price build-up, P&L, FCF, NPV/IRR/payback, RoCE",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Per-SKU pipeline
// ---------------------------------------------------------------------------

fn project_sku(
    sku: &Sku,
    finance: &FinanceAssumptions,
    config: &EngineConfig,
) -> SkuFinanceResult<SkuOutput> {
    let years = config.horizon_years;
    let capacity = sku_capacity(sku, config)?;
    let volumes = sku_volumes(sku, finance, years)?;
    let prices = build_prices(sku, &capacity, years)?;
    let pnl = build_pnl(sku, &capacity, &volumes, &prices, finance, config)?;
    let capital = CapitalBase {
        initial_capex: sku.ops.total_capex(),
        working_capital_days: sku.ops.working_capital_days,
    };
    let (cashflow, returns) = compute_returns(&pnl, capital, finance, config)?;

    Ok(SkuOutput {
        sku_id: sku.id.clone(),
        sku_name: sku.name.clone(),
        capacity,
        volumes,
        prices,
        pnl,
        cashflow,
        returns,
    })
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn wacc_source(finance: &FinanceAssumptions) -> &'static str {
    if finance.wacc_override.is_some() {
        "override"
    } else if finance.is_unset() {
        "default"
    } else {
        "build_up"
    }
}

fn collect_warnings(case: &BusinessCase, output: &CalcOutput) -> Vec<String> {
    let mut warnings = Vec::new();

    for (sku, out) in case.skus.iter().zip(output.by_sku.iter()) {
        if sku.sales.product_weight_grams.is_zero() {
            warnings.push(format!(
                "SKU {}: product weight is zero; per-kg figures are reported as 0",
                sku.id
            ));
        }
        if let Some(v) = out
            .volumes
            .iter()
            .find(|v| v.pieces > out.capacity.annual_capacity)
        {
            warnings.push(format!(
                "SKU {}: year {} volume {} exceeds annual capacity {}",
                sku.id,
                v.year,
                v.pieces.round_dp(0),
                out.capacity.annual_capacity.round_dp(0)
            ));
        }
    }

    if output.returns.irr.is_none() {
        warnings.push("IRR is undefined for the consolidated cash flows".into());
    }
    if output.returns.payback_years.is_none() {
        warnings.push(format!(
            "Investment is not paid back within {} years",
            output.horizon_years
        ));
    }
    if output.returns.npv < Decimal::ZERO {
        warnings.push("Consolidated NPV is negative".into());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::{sample_case, sample_sku};
    use crate::error::SkuFinanceError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_sku_totals_match_sku() {
        let out = calculate(&sample_case()).unwrap();
        assert_eq!(out.by_sku.len(), 1);
        assert_eq!(out.pnl, out.by_sku[0].pnl);
        assert_eq!(out.returns.npv, out.by_sku[0].returns.npv);
        assert_eq!(out.cashflow.len(), 11);
        assert_eq!(out.returns.wacc, dec!(0.117));
    }

    #[test]
    fn test_two_skus_sum() {
        let mut case = sample_case();
        let mut b = sample_sku("SKU-2");
        b.sales.base_annual_volume = dec!(30000);
        case.skus.push(b);
        let out = calculate(&case).unwrap();
        let a = &out.by_sku[0].pnl[0];
        let b = &out.by_sku[1].pnl[0];
        assert_eq!(out.pnl[0].revenue_net, a.revenue_net + b.revenue_net);
        assert_eq!(out.pnl[0].pat, a.pat + b.pat);
        assert_eq!(out.volumes[0].pieces, dec!(40000));
        assert_eq!(out.cashflow[0].fcf, dec!(-1400000));
    }

    #[test]
    fn test_empty_case_fails_fast() {
        let mut case = sample_case();
        case.skus.clear();
        assert!(matches!(
            calculate(&case),
            Err(SkuFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_horizon_from_config() {
        let config = EngineConfig {
            horizon_years: 3,
            reporting_years: 3,
            ..EngineConfig::default()
        };
        let out = calculate_with_config(&sample_case(), &config).unwrap();
        assert_eq!(out.pnl.len(), 3);
        assert_eq!(out.by_sku[0].prices.len(), 3);
        assert_eq!(out.cashflow.len(), 4);
    }

    #[test]
    fn test_envelope_carries_warnings() {
        let mut case = sample_case();
        case.skus[0].sales.base_annual_volume = dec!(200000);
        let env = calculate_case(&case, &EngineConfig::default()).unwrap();
        assert!(env.warnings.iter().any(|w| w.contains("exceeds annual capacity")));
        assert_eq!(env.assumptions["wacc_source"], "build_up");
        assert_eq!(env.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_deterministic() {
        let a = serde_json::to_string(&calculate(&sample_case()).unwrap()).unwrap();
        let b = serde_json::to_string(&calculate(&sample_case()).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
