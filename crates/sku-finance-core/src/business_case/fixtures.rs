//! Shared test fixtures.

use rust_decimal_macros::dec;

use super::inputs::*;

/// 100 g part, 10 000 pcs/yr, resin 80 Rs/kg (5% discount, 5 Rs/kg freight,
/// 2% wastage), MB 120 Rs/kg at 2%, conversion 0.50 Rs/pc.
pub fn sample_sku(id: &str) -> Sku {
    Sku {
        id: id.into(),
        name: format!("Closure {id}"),
        sales: SalesInputs {
            product_weight_grams: dec!(100),
            base_annual_volume: dec!(10000),
            conversion_recovery_rs_per_piece: dec!(0.5),
            machine_rate_rs_per_day: None,
            yoy_growth: None,
            sales_discount: dec!(0),
        },
        npd: NpdInputs {
            cavities: 4,
            cycle_time_seconds: dec!(20),
            machine_id: Some("IMM-250T".into()),
            plant_id: Some("PLANT-1".into()),
            material_id: Some("PP-H110".into()),
        },
        ops: OpsInputs {
            operating_hours_per_day: None,
            working_days_per_year: None,
            shifts_per_day: None,
            oee: dec!(0.85),
            machine_power_kw: dec!(30),
            manpower_per_shift: dec!(1),
            machine_capex_new: dec!(500000),
            machine_value_old: dec!(0),
            mould_capex: dec!(200000),
            infra_capex: dec!(0),
            machine_life_years: None,
            mould_life_years: None,
            infra_life_years: None,
            working_capital_days: dec!(45),
        },
        costing: CostingInputs {
            resin_rs_per_kg: dec!(80),
            resin_discount: dec!(0.05),
            freight_in_rs_per_kg: dec!(5),
            wastage: dec!(0.02),
            masterbatch_rs_per_kg: dec!(120),
            use_mb_override: true,
            masterbatch_ratio: dec!(0.02),
            packaging_rs_per_kg: dec!(0),
            freight_out_rs_per_kg: dec!(0),
            value_add_rs_per_piece: dec!(0),
            conversion_inflation: vec![],
            rm_inflation: vec![],
        },
        plant: PlantMaster {
            plant_id: Some("PLANT-1".into()),
            manpower_rs_per_shift: dec!(800),
            power_rs_per_unit: dec!(8),
            rm_rs_per_kg: dec!(2),
            other_mfg_rs_per_kg: dec!(1.5),
            plant_sga_rs_per_kg: dec!(3),
            corp_sga_rs_per_kg: dec!(2),
            sga_rs_per_kg: dec!(5),
            conversion_cost_rs_per_kg: dec!(0),
        },
    }
}

pub fn sample_finance() -> FinanceAssumptions {
    FinanceAssumptions {
        include_corp_sga: false,
        debt_share: Some(dec!(0.70)),
        cost_of_debt: Some(dec!(0.12)),
        cost_of_equity: Some(dec!(0.18)),
        tax_rate: Some(dec!(0.25)),
        wacc_override: None,
        annual_volume_growth: dec!(0),
        debt_basis: DebtBasis::TotalCapex,
        debt_tenor_years: None,
    }
}

pub fn sample_case() -> BusinessCase {
    BusinessCase {
        id: "BC-1".into(),
        name: "Closures programme".into(),
        skus: vec![sample_sku("SKU-1")],
        finance: sample_finance(),
        created_at: None,
        updated_at: None,
    }
}
