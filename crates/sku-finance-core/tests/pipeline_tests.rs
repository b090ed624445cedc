use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use sku_finance_core::aggregation::weighted_average;
use sku_finance_core::business_case::{BusinessCase, DebtBasis};
use sku_finance_core::projection::pnl::tax_on;
use sku_finance_core::projection::volume::project_volumes;
use sku_finance_core::{calculate, calculate_case, calculate_with_config, EngineConfig, SkuFinanceError};

fn two_sku_case() -> BusinessCase {
    serde_json::from_str(include_str!("data/two_sku_case.json")).unwrap()
}

/// The first SKU of the fixture on its own, with flat volume.
fn single_sku_case() -> BusinessCase {
    let mut case = two_sku_case();
    case.skus.truncate(1);
    case.skus[0].costing.rm_inflation.clear();
    case.skus[0].costing.conversion_inflation.clear();
    case.finance.annual_volume_growth = Decimal::ZERO;
    case
}

// ===========================================================================
// End-to-end
// ===========================================================================

#[test]
fn test_reference_single_sku_case() {
    let out = calculate(&single_sku_case()).unwrap();

    // 0.7 × 0.12 × 0.75 + 0.3 × 0.18
    assert_eq!(out.returns.wacc, dec!(0.117));

    // RM 82.62 + MB 2.448 + conversion 5 per kg, 1 000 kg
    assert_eq!(out.pnl[0].revenue_net, dec!(90068));
    assert_eq!(out.by_sku[0].prices[0].per_kg.total, dec!(90.068));

    for year in &out.pnl {
        if year.pbt < Decimal::ZERO {
            assert_eq!(year.tax, Decimal::ZERO);
        }
        assert!(year.tax >= Decimal::ZERO);
    }
}

#[test]
fn test_case_totals_are_sum_of_skus() {
    let out = calculate(&two_sku_case()).unwrap();
    assert_eq!(out.by_sku.len(), 2);
    assert_eq!(out.pnl.len(), 10);

    for (i, total) in out.pnl.iter().enumerate() {
        let a = &out.by_sku[0].pnl[i];
        let b = &out.by_sku[1].pnl[i];
        assert_eq!(total.revenue_net, a.revenue_net + b.revenue_net);
        assert_eq!(total.ebitda, a.ebitda + b.ebitda);
        assert_eq!(total.pat, a.pat + b.pat);
        assert_eq!(out.volumes[i].weight_kg, out.by_sku[0].volumes[i].weight_kg + out.by_sku[1].volumes[i].weight_kg);
    }

    // 500 000 + 200 000 + 2 500 000 + 300 000 + 600 000 + 400 000
    assert_eq!(out.cashflow[0].fcf, dec!(-4500000));
}

#[test]
fn test_sku_growth_overrides_case_growth() {
    let out = calculate(&two_sku_case()).unwrap();
    let sku1 = &out.by_sku[0].volumes;
    let sku2 = &out.by_sku[1].volumes;
    assert_eq!(sku1[1].pieces, dec!(10500));
    assert_eq!(sku2[1].pieces, dec!(440000));
}

#[test]
fn test_price_per_kg_reconciles_with_price_per_piece() {
    let out = calculate(&two_sku_case()).unwrap();
    let tolerance = dec!(0.000001);
    for (sku, sku_out) in two_sku_case().skus.iter().zip(&out.by_sku) {
        let weight_kg = sku.sales.product_weight_grams / dec!(1000);
        for price in &sku_out.prices {
            let implied = price.per_kg.total * weight_kg;
            let gap = (implied - price.price_per_piece).abs();
            assert!(
                gap <= tolerance * price.price_per_piece.abs().max(Decimal::ONE),
                "year {}: {implied} vs {}",
                price.year,
                price.price_per_piece
            );
        }
    }
}

#[test]
fn test_raw_material_inflation_compounds() {
    let out = calculate(&two_sku_case()).unwrap();
    let prices = &out.by_sku[0].prices;
    let rm1 = prices[0].per_kg.raw_material;
    assert_eq!(prices[1].per_kg.raw_material, rm1 * dec!(1.03));
    assert_eq!(prices[2].per_kg.raw_material, rm1 * dec!(1.03) * dec!(1.03));
    // Series shorter than the horizon: later years hold the last factor
    assert_eq!(prices[9].per_kg.raw_material, prices[4].per_kg.raw_material);
}

#[test]
fn test_weighted_price_invariant_to_volume_split() {
    let mut case = single_sku_case();
    let mut twin = case.skus[0].clone();
    twin.id = "SKU-1B".into();
    twin.sales.base_annual_volume = dec!(37000);
    case.skus.push(twin);

    let out = calculate(&case).unwrap();
    let common = out.by_sku[0].prices[0].per_kg.total;
    let weighted = out.weighted_price_per_kg[0].per_kg.total;
    assert!((weighted - common).abs() < dec!(0.0000000001));
}

#[test]
fn test_depreciation_stops_after_asset_life() {
    let out = calculate(&single_sku_case()).unwrap();
    let machine = dec!(500000) / dec!(15);
    let mould = dec!(200000) / dec!(5);
    assert_eq!(out.pnl[4].depreciation, machine + mould);
    assert_eq!(out.pnl[5].depreciation, machine);
}

#[test]
fn test_debt_basis_switch_changes_interest() {
    let mut case = single_sku_case();
    case.finance.debt_basis = DebtBasis::TotalCapex;
    let total = calculate(&case).unwrap();
    case.finance.debt_basis = DebtBasis::NewMachineCapex;
    let machine_only = calculate(&case).unwrap();

    assert_eq!(total.pnl[0].interest, dec!(58800));
    assert_eq!(machine_only.pnl[0].interest, dec!(42000));
    assert!(machine_only.pnl[0].pbt > total.pnl[0].pbt);
}

#[test]
fn test_amortising_debt_reduces_interest() {
    let mut case = single_sku_case();
    case.finance.debt_tenor_years = Some(5);
    let out = calculate(&case).unwrap();
    assert_eq!(out.pnl[0].interest, dec!(58800));
    assert_eq!(out.pnl[1].interest, dec!(47040));
    assert_eq!(out.pnl[5].interest, Decimal::ZERO);
}

#[test]
fn test_corp_sga_gate() {
    let mut case = single_sku_case();
    let without = calculate(&case).unwrap();
    case.finance.include_corp_sga = true;
    let with = calculate(&case).unwrap();
    assert_eq!(without.pnl[0].corp_sga, Decimal::ZERO);
    assert_eq!(with.pnl[0].corp_sga, dec!(2000));
    assert_eq!(without.pnl[0].ebitda - with.pnl[0].ebitda, dec!(2000));
}

#[test]
fn test_horizon_follows_config() {
    let config = EngineConfig {
        horizon_years: 6,
        reporting_years: 3,
        ..EngineConfig::default()
    };
    let out = calculate_with_config(&two_sku_case(), &config).unwrap();
    assert_eq!(out.pnl.len(), 6);
    assert_eq!(out.cashflow.len(), 7);
    assert_eq!(out.reporting_years, 3);
}

#[test]
fn test_validation_names_the_field() {
    let mut case = two_sku_case();
    case.skus[1].npd.cycle_time_seconds = Decimal::ZERO;
    match calculate(&case).unwrap_err() {
        SkuFinanceError::InvalidInput { field, .. } => {
            assert_eq!(field, "skus[1].npd.cycle_time_seconds")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_runaway_growth_is_rejected_not_a_panic() {
    let mut case = two_sku_case();
    case.skus[0].sales.yoy_growth = Some(dec!(1000));
    match calculate(&case).unwrap_err() {
        SkuFinanceError::InvalidInput { field, .. } => {
            assert_eq!(field, "skus[0].sales.yoy_growth")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_out_of_range_arithmetic_is_an_error() {
    let mut case = two_sku_case();
    case.skus[0].sales.base_annual_volume = dec!(70000000000000000000000000000);
    let err = calculate(&case).unwrap_err();
    assert_eq!(err.kind(), "overflow");

    let mut case = two_sku_case();
    case.skus[0].costing.resin_rs_per_kg = Decimal::MAX;
    let err = calculate(&case).unwrap_err();
    assert!(
        matches!(err, SkuFinanceError::Overflow { .. } | SkuFinanceError::Aborted { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_envelope_and_serialization() {
    let out = calculate_case(&two_sku_case(), &EngineConfig::default()).unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.result.case_id, "BC-2");

    let json = serde_json::to_value(&out.result).unwrap();
    assert_eq!(json["by_sku"][1]["sku_id"], "SKU-2");
    assert!(json["returns"]["npv"].is_string());
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_volume_compounds_multiplicatively(
        base in 1u32..5_000_000,
        growth_bp in -500i64..3000,
        k in 0usize..10,
    ) {
        let growth = Decimal::new(growth_bp, 4);
        let base = Decimal::from(base);
        let volumes = project_volumes(base, growth, dec!(50), 10).unwrap();
        let expected = base * (Decimal::ONE + growth).powi(k as i64);
        let actual = volumes[k].pieces;
        let tolerance = dec!(0.000000001) * expected.abs().max(Decimal::ONE);
        prop_assert!((actual - expected).abs() <= tolerance, "{actual} vs {expected}");
    }

    #[test]
    fn prop_tax_is_never_negative(
        pbt_paise in -1_000_000_000i64..1_000_000_000,
        rate_bp in 0i64..=10_000,
    ) {
        let pbt = Decimal::new(pbt_paise, 2);
        let rate = Decimal::new(rate_bp, 4);
        let tax = tax_on(pbt, rate);
        prop_assert!(tax >= Decimal::ZERO);
        prop_assert_eq!(tax, pbt.max(Decimal::ZERO) * rate);
    }

    #[test]
    fn prop_weighted_average_of_equal_values(
        value_paise in -10_000_000i64..10_000_000,
        w1 in 0u32..1_000_000,
        w2 in 1u32..1_000_000,
    ) {
        let v = Decimal::new(value_paise, 2);
        let avg = weighted_average(&[v, v], &[Decimal::from(w1), Decimal::from(w2)]);
        prop_assert!((avg - v).abs() < dec!(0.0000000001));
    }
}
