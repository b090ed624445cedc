use std::ops::AddAssign;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::business_case::{DebtBasis, FinanceAssumptions, OpsInputs, Sku};
use crate::config::EngineConfig;
use crate::types::{Money, Rate};
use crate::SkuFinanceResult;

use super::capacity::Capacity;
use super::pricing::PriceYear;
use super::units::{inflation_factors, safe_divide_positive};
use super::volume::YearVolumes;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Profit and loss for one year, either for a single SKU or summed across
/// the case.
///
/// Packaging and freight-out sit in material cost only. Conversion cost is
/// power, manpower, value-add, conversion recovery, R&M and other
/// manufacturing, or the blended per-kg rate when the plant has no drivers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlYear {
    pub year: u32,
    pub revenue_gross: Money,
    /// Conversion recovery billed inside the gross revenue
    pub conversion_revenue: Money,
    /// Value-add billed inside the gross revenue
    pub value_add_revenue: Money,
    pub sales_discount: Money,
    pub revenue_net: Money,
    pub raw_material_cost: Money,
    pub masterbatch_cost: Money,
    pub packaging_cost: Money,
    pub freight_out_cost: Money,
    pub material_cost: Money,
    pub material_margin: Money,
    pub power_cost: Money,
    pub manpower_cost: Money,
    pub value_add_cost: Money,
    pub conversion_recovery_cost: Money,
    pub repairs_maintenance_cost: Money,
    pub other_mfg_cost: Money,
    pub conversion_cost: Money,
    pub gross_margin: Money,
    pub plant_sga: Money,
    pub corp_sga: Money,
    pub sga: Money,
    pub ebitda: Money,
    pub depreciation: Money,
    pub ebit: Money,
    pub opening_debt: Money,
    pub interest: Money,
    pub pbt: Money,
    pub tax: Money,
    pub pat: Money,
}

impl AddAssign<&PnlYear> for PnlYear {
    fn add_assign(&mut self, o: &PnlYear) {
        self.revenue_gross += o.revenue_gross;
        self.conversion_revenue += o.conversion_revenue;
        self.value_add_revenue += o.value_add_revenue;
        self.sales_discount += o.sales_discount;
        self.revenue_net += o.revenue_net;
        self.raw_material_cost += o.raw_material_cost;
        self.masterbatch_cost += o.masterbatch_cost;
        self.packaging_cost += o.packaging_cost;
        self.freight_out_cost += o.freight_out_cost;
        self.material_cost += o.material_cost;
        self.material_margin += o.material_margin;
        self.power_cost += o.power_cost;
        self.manpower_cost += o.manpower_cost;
        self.value_add_cost += o.value_add_cost;
        self.conversion_recovery_cost += o.conversion_recovery_cost;
        self.repairs_maintenance_cost += o.repairs_maintenance_cost;
        self.other_mfg_cost += o.other_mfg_cost;
        self.conversion_cost += o.conversion_cost;
        self.gross_margin += o.gross_margin;
        self.plant_sga += o.plant_sga;
        self.corp_sga += o.corp_sga;
        self.sga += o.sga;
        self.ebitda += o.ebitda;
        self.depreciation += o.depreciation;
        self.ebit += o.ebit;
        self.opening_debt += o.opening_debt;
        self.interest += o.interest;
        self.pbt += o.pbt;
        self.tax += o.tax;
        self.pat += o.pat;
    }
}

// ---------------------------------------------------------------------------
// Finance helpers
// ---------------------------------------------------------------------------

pub fn effective_tax_rate(finance: &FinanceAssumptions, config: &EngineConfig) -> Rate {
    finance.tax_rate.unwrap_or(config.default_tax_rate)
}

/// Tax on profit before tax; losses are never credited.
pub fn tax_on(pbt: Money, tax_rate: Rate) -> Money {
    pbt.max(Decimal::ZERO) * tax_rate
}

/// Debt raised at year 0 for one SKU.
pub fn initial_debt(ops: &OpsInputs, finance: &FinanceAssumptions) -> Money {
    let basis = match finance.debt_basis {
        DebtBasis::NewMachineCapex => ops.machine_capex_new,
        DebtBasis::TotalCapex => ops.total_capex(),
    };
    finance.debt_share.unwrap_or(Decimal::ZERO) * basis
}

/// Debt outstanding at the start of each year. With a tenor the principal
/// amortises straight line; without one it is repaid as a bullet after the
/// horizon.
pub fn opening_debt_schedule(initial: Money, tenor_years: Option<u32>, years: usize) -> Vec<Money> {
    (1..=years)
        .map(|k| match tenor_years.filter(|t| *t > 0) {
            Some(t) => {
                let repaid = Decimal::from(k as u64 - 1) / Decimal::from(t);
                initial * (Decimal::ONE - repaid).max(Decimal::ZERO)
            }
            None => initial,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Depreciation
// ---------------------------------------------------------------------------

/// Useful lives actually applied: the SKU's own value unless unset or zero.
pub fn asset_lives(ops: &OpsInputs, config: &EngineConfig) -> (u32, u32, u32) {
    let pick = |own: Option<u32>, default: u32| own.filter(|l| *l > 0).unwrap_or(default);
    (
        pick(ops.machine_life_years, config.default_machine_life_years),
        pick(ops.mould_life_years, config.default_mould_life_years),
        pick(ops.infra_life_years, config.default_infra_life_years),
    )
}

/// Straight-line charge per asset class, stopping once the asset's life has
/// run out. Machine base is the new capex plus the old machine's value.
pub fn depreciation_schedule(ops: &OpsInputs, config: &EngineConfig, years: usize) -> Vec<Money> {
    let (machine_life, mould_life, infra_life) = asset_lives(ops, config);
    let assets = [
        (ops.machine_capex_new + ops.machine_value_old, machine_life),
        (ops.mould_capex, mould_life),
        (ops.infra_capex, infra_life),
    ];

    (1..=years as u32)
        .map(|year| {
            assets
                .iter()
                .filter(|(_, life)| year <= *life)
                .map(|(base, life)| *base / Decimal::from(*life))
                .sum()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// P&L builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ConversionLines {
    power: Money,
    manpower: Money,
    value_add: Money,
    conversion_recovery: Money,
    repairs_maintenance: Money,
    other_mfg: Money,
}

impl ConversionLines {
    fn total(&self) -> Money {
        self.power
            + self.manpower
            + self.value_add
            + self.conversion_recovery
            + self.repairs_maintenance
            + self.other_mfg
    }
}

/// Per-year P&L of one SKU. `volumes` and `prices` must cover the same years.
pub fn build_pnl(
    sku: &Sku,
    capacity: &Capacity,
    volumes: &[YearVolumes],
    prices: &[PriceYear],
    finance: &FinanceAssumptions,
    config: &EngineConfig,
) -> SkuFinanceResult<Vec<PnlYear>> {
    let years = volumes.len().min(prices.len());
    let conv_factors = inflation_factors(&sku.costing.conversion_inflation, years)?;
    let depreciation = depreciation_schedule(&sku.ops, config, years);
    let opening_debt = opening_debt_schedule(
        initial_debt(&sku.ops, finance),
        finance.debt_tenor_years,
        years,
    );
    let tax_rate = effective_tax_rate(finance, config);
    let cost_of_debt = finance.cost_of_debt.unwrap_or(Decimal::ZERO);

    let plant = &sku.plant;
    let ops = &sku.ops;
    let operating_days = capacity.days_per_year;
    let power_per_year =
        ops.machine_power_kw * capacity.hours_per_day * operating_days * plant.power_rs_per_unit;
    let manpower_per_year = ops.manpower_per_shift
        * capacity.shifts_per_day
        * operating_days
        * plant.manpower_rs_per_shift;
    let itemised = !(power_per_year.is_zero()
        && manpower_per_year.is_zero()
        && plant.rm_rs_per_kg.is_zero()
        && plant.other_mfg_rs_per_kg.is_zero());

    let (plant_sga_rate, corp_sga_rate) =
        if plant.plant_sga_rs_per_kg.is_zero() && plant.corp_sga_rs_per_kg.is_zero() {
            (plant.sga_rs_per_kg, Decimal::ZERO)
        } else {
            (plant.plant_sga_rs_per_kg, plant.corp_sga_rs_per_kg)
        };

    Ok((0..years)
        .map(|i| {
            let vol = &volumes[i];
            let price = &prices[i];
            let conv_f = conv_factors[i];
            let kg = vol.weight_kg;

            // Revenue
            let revenue_gross = price.price_per_piece * vol.pieces;
            let sales_discount = revenue_gross * sku.sales.sales_discount;
            let revenue_net = revenue_gross - sales_discount;

            // Material
            let raw_material_cost = price.per_kg.raw_material * kg;
            let masterbatch_cost = price.per_kg.masterbatch * kg;
            let packaging_cost = price.per_kg.packaging * kg;
            let freight_out_cost = price.per_kg.freight_out * kg;
            let material_cost =
                raw_material_cost + masterbatch_cost + packaging_cost + freight_out_cost;
            let material_margin = revenue_net - material_cost;

            // Conversion
            let utilisation = safe_divide_positive(kg, capacity.annual_capacity_kg);
            let lines = if itemised {
                ConversionLines {
                    power: power_per_year * utilisation * conv_f,
                    manpower: manpower_per_year * utilisation * conv_f,
                    // per-kg price lines already carry the conversion inflation
                    value_add: price.per_kg.value_add * kg,
                    conversion_recovery: price.per_kg.conversion * kg,
                    repairs_maintenance: plant.rm_rs_per_kg * kg * conv_f,
                    other_mfg: plant.other_mfg_rs_per_kg * kg * conv_f,
                }
            } else {
                ConversionLines::default()
            };
            let conversion_cost = if itemised {
                lines.total()
            } else {
                plant.conversion_cost_rs_per_kg.max(Decimal::ZERO) * kg * conv_f
            };
            let gross_margin = material_margin - conversion_cost;

            // SG&A
            let plant_sga = plant_sga_rate * kg * conv_f;
            let corp_sga = if finance.include_corp_sga {
                corp_sga_rate * kg * conv_f
            } else {
                Decimal::ZERO
            };
            let sga = plant_sga + corp_sga;
            let ebitda = gross_margin - sga;

            // Below EBITDA
            let ebit = ebitda - depreciation[i];
            let interest = opening_debt[i] * cost_of_debt;
            let pbt = ebit - interest;
            let tax = tax_on(pbt, tax_rate);

            PnlYear {
                year: vol.year,
                revenue_gross,
                conversion_revenue: price.per_piece.conversion * vol.pieces,
                value_add_revenue: price.per_piece.value_add * vol.pieces,
                sales_discount,
                revenue_net,
                raw_material_cost,
                masterbatch_cost,
                packaging_cost,
                freight_out_cost,
                material_cost,
                material_margin,
                power_cost: lines.power,
                manpower_cost: lines.manpower,
                value_add_cost: lines.value_add,
                conversion_recovery_cost: lines.conversion_recovery,
                repairs_maintenance_cost: lines.repairs_maintenance,
                other_mfg_cost: lines.other_mfg,
                conversion_cost,
                gross_margin,
                plant_sga,
                corp_sga,
                sga,
                ebitda,
                depreciation: depreciation[i],
                ebit,
                opening_debt: opening_debt[i],
                interest,
                pbt,
                tax,
                pat: pbt - tax,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::{sample_finance, sample_sku};
    use crate::projection::capacity::sku_capacity;
    use crate::projection::pricing::build_prices;
    use crate::projection::volume::sku_volumes;
    use rust_decimal_macros::dec;

    fn pnl_for(sku: &Sku, finance: &FinanceAssumptions, years: usize) -> Vec<PnlYear> {
        let config = EngineConfig::default();
        let cap = sku_capacity(sku, &config).unwrap();
        let volumes = sku_volumes(sku, finance, years).unwrap();
        let prices = build_prices(sku, &cap, years).unwrap();
        build_pnl(sku, &cap, &volumes, &prices, finance, &config).unwrap()
    }

    #[test]
    fn test_year_one_waterfall() {
        let p = &pnl_for(&sample_sku("A"), &sample_finance(), 1)[0];
        // 9.0068 per piece × 10 000
        assert_eq!(p.revenue_gross, dec!(90068));
        assert_eq!(p.conversion_revenue, dec!(5000));
        assert_eq!(p.revenue_net, dec!(90068));
        // 1 000 kg × (82.62 + 2.448)
        assert_eq!(p.material_cost, dec!(85068));
        assert_eq!(p.material_margin, dec!(5000));
        assert_eq!(p.ebitda, p.gross_margin - p.sga);
        assert_eq!(p.ebit, p.ebitda - p.depreciation);
        assert_eq!(p.pbt, p.ebit - p.interest);
        assert_eq!(p.pat, p.pbt - p.tax);
    }

    #[test]
    fn test_conversion_cost_scales_with_utilisation() {
        let p = &pnl_for(&sample_sku("A"), &sample_finance(), 1)[0];
        let utilisation = dec!(1000) / dec!(8935.2);
        // 30 kW × 24 h × 365 d × 8 Rs/kWh
        let power = dec!(30) * dec!(24) * dec!(365) * dec!(8) * utilisation;
        // 1 × 3 shifts × 365 d × 800 Rs/shift
        let manpower = dec!(3) * dec!(365) * dec!(800) * utilisation;
        assert_eq!(p.power_cost, power);
        assert_eq!(p.manpower_cost, manpower);
        assert_eq!(p.repairs_maintenance_cost, dec!(2000));
        assert_eq!(p.other_mfg_cost, dec!(1500));
        // 0.5 Rs/piece recovery over 0.1 kg pieces, 1 000 kg
        assert_eq!(p.conversion_recovery_cost, dec!(5000));
        assert_eq!(p.value_add_cost, Decimal::ZERO);
        assert_eq!(p.conversion_cost, power + manpower + dec!(5000) + dec!(3500));
    }

    #[test]
    fn test_conversion_cost_includes_value_add_and_recovery() {
        let mut sku = sample_sku("A");
        sku.costing.value_add_rs_per_piece = dec!(0.2);
        let p = &pnl_for(&sku, &sample_finance(), 1)[0];
        // 0.2 / 0.1 kg × 1 000 kg
        assert_eq!(p.value_add_cost, dec!(2000));
        assert_eq!(p.value_add_cost, p.value_add_revenue);
        assert_eq!(p.conversion_recovery_cost, p.conversion_revenue);
        assert_eq!(
            p.conversion_cost,
            p.power_cost
                + p.manpower_cost
                + p.value_add_cost
                + p.conversion_recovery_cost
                + p.repairs_maintenance_cost
                + p.other_mfg_cost
        );
        // packaging and freight-out stay in material cost only
        assert_eq!(
            p.material_cost,
            p.raw_material_cost + p.masterbatch_cost + p.packaging_cost + p.freight_out_cost
        );
    }

    #[test]
    fn test_blended_conversion_rate_when_no_drivers() {
        let mut sku = sample_sku("A");
        sku.plant.power_rs_per_unit = Decimal::ZERO;
        sku.plant.manpower_rs_per_shift = Decimal::ZERO;
        sku.plant.rm_rs_per_kg = Decimal::ZERO;
        sku.plant.other_mfg_rs_per_kg = Decimal::ZERO;
        sku.plant.conversion_cost_rs_per_kg = dec!(12);
        let p = &pnl_for(&sku, &sample_finance(), 1)[0];
        assert_eq!(p.conversion_cost, dec!(12000));
        assert_eq!(p.power_cost, Decimal::ZERO);
    }

    #[test]
    fn test_zero_weight_has_no_conversion_cost() {
        let mut sku = sample_sku("A");
        sku.sales.product_weight_grams = Decimal::ZERO;
        let p = &pnl_for(&sku, &sample_finance(), 1)[0];
        assert_eq!(p.conversion_cost, Decimal::ZERO);
        assert_eq!(p.material_cost, Decimal::ZERO);
    }

    #[test]
    fn test_corp_sga_gated_by_flag() {
        let sku = sample_sku("A");
        let mut finance = sample_finance();
        let without = &pnl_for(&sku, &finance, 1)[0];
        assert_eq!(without.corp_sga, Decimal::ZERO);
        assert_eq!(without.plant_sga, dec!(3000));

        finance.include_corp_sga = true;
        let with = &pnl_for(&sku, &finance, 1)[0];
        assert_eq!(with.corp_sga, dec!(2000));
        assert_eq!(with.sga, dec!(5000));
    }

    #[test]
    fn test_aggregate_sga_used_without_split() {
        let mut sku = sample_sku("A");
        sku.plant.plant_sga_rs_per_kg = Decimal::ZERO;
        sku.plant.corp_sga_rs_per_kg = Decimal::ZERO;
        let p = &pnl_for(&sku, &sample_finance(), 1)[0];
        assert_eq!(p.plant_sga, dec!(5000));
    }

    #[test]
    fn test_tax_never_negative() {
        assert_eq!(tax_on(dec!(-500), dec!(0.25)), Decimal::ZERO);
        assert_eq!(tax_on(dec!(400), dec!(0.25)), dec!(100));
        // the sample case loses money once depreciation and interest land
        let p = &pnl_for(&sample_sku("A"), &sample_finance(), 1)[0];
        assert!(p.pbt < Decimal::ZERO);
        assert_eq!(p.tax, Decimal::ZERO);
        assert_eq!(p.pat, p.pbt);
    }

    #[test]
    fn test_depreciation_stops_after_life() {
        let mut sku = sample_sku("A");
        sku.ops.machine_capex_new = dec!(300);
        sku.ops.machine_life_years = Some(3);
        sku.ops.mould_capex = dec!(100);
        sku.ops.mould_life_years = Some(2);
        let dep = depreciation_schedule(&sku.ops, &EngineConfig::default(), 4);
        assert_eq!(dep, vec![dec!(150), dec!(150), dec!(100), dec!(0)]);
    }

    #[test]
    fn test_zero_life_falls_back_to_default() {
        let mut sku = sample_sku("A");
        sku.ops.mould_life_years = Some(0);
        let (_, mould, _) = asset_lives(&sku.ops, &EngineConfig::default());
        assert_eq!(mould, 5);
    }

    #[test]
    fn test_debt_basis_switch() {
        let sku = sample_sku("A");
        let mut finance = sample_finance();
        // 0.7 × (500 000 + 200 000)
        assert_eq!(initial_debt(&sku.ops, &finance), dec!(490000));
        finance.debt_basis = DebtBasis::NewMachineCapex;
        assert_eq!(initial_debt(&sku.ops, &finance), dec!(350000));
    }

    #[test]
    fn test_amortising_debt() {
        let sched = opening_debt_schedule(dec!(1000), Some(4), 6);
        assert_eq!(
            sched,
            vec![dec!(1000), dec!(750), dec!(500), dec!(250), dec!(0), dec!(0)]
        );
        assert_eq!(opening_debt_schedule(dec!(1000), None, 3), vec![dec!(1000); 3]);
    }

    #[test]
    fn test_interest_on_opening_debt() {
        let p = &pnl_for(&sample_sku("A"), &sample_finance(), 1)[0];
        assert_eq!(p.interest, dec!(490000) * dec!(0.12));
    }

    #[test]
    fn test_add_assign_sums_fields() {
        let a = &pnl_for(&sample_sku("A"), &sample_finance(), 1)[0];
        let mut total = PnlYear {
            year: 1,
            ..PnlYear::default()
        };
        total += a;
        total += a;
        assert_eq!(total.revenue_net, a.revenue_net * dec!(2));
        assert_eq!(total.pat, a.pat * dec!(2));
        assert_eq!(total.year, 1);
    }
}
