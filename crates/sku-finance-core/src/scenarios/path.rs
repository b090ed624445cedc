//! Typed addresses of the mutable numeric inputs of a business case.
//!
//! Paths are dotted strings such as `skus.0.costing.resin_rs_per_kg`,
//! `skus.1.costing.rm_inflation.3` or `finance.tax_rate`. Group and field
//! names may also be written in camelCase (`skus.0.costing.resinRsPerKg`).
//! Unknown names are rejected when the string is parsed; a SKU index past
//! the end of the case is rejected when the path is applied.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::business_case::{BusinessCase, FinanceAssumptions, Sku};
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::returns::resolve_wacc;
use crate::SkuFinanceResult;

/// Highest accepted index into a yearly rate series.
const MAX_SERIES_INDEX: usize = 99;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkuField {
    ProductWeightGrams,
    BaseAnnualVolume,
    ConversionRecoveryRsPerPiece,
    MachineRateRsPerDay,
    YoyGrowth,
    SalesDiscount,
    Cavities,
    CycleTimeSeconds,
    OperatingHoursPerDay,
    WorkingDaysPerYear,
    ShiftsPerDay,
    Oee,
    MachinePowerKw,
    ManpowerPerShift,
    MachineCapexNew,
    MachineValueOld,
    MouldCapex,
    InfraCapex,
    MachineLifeYears,
    MouldLifeYears,
    InfraLifeYears,
    WorkingCapitalDays,
    ResinRsPerKg,
    ResinDiscount,
    FreightInRsPerKg,
    Wastage,
    MasterbatchRsPerKg,
    MasterbatchRatio,
    PackagingRsPerKg,
    FreightOutRsPerKg,
    ValueAddRsPerPiece,
    ConversionInflation(usize),
    RmInflation(usize),
    ManpowerRsPerShift,
    PowerRsPerUnit,
    PlantRmRsPerKg,
    OtherMfgRsPerKg,
    PlantSgaRsPerKg,
    CorpSgaRsPerKg,
    SgaRsPerKg,
    ConversionCostRsPerKg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinanceField {
    DebtShare,
    CostOfDebt,
    CostOfEquity,
    TaxRate,
    WaccOverride,
    AnnualVolumeGrowth,
    DebtTenorYears,
}

/// (group, field, variant) for every scalar SKU field.
const SKU_FIELDS: &[(&str, &str, SkuField)] = &[
    ("sales", "product_weight_grams", SkuField::ProductWeightGrams),
    ("sales", "base_annual_volume", SkuField::BaseAnnualVolume),
    ("sales", "conversion_recovery_rs_per_piece", SkuField::ConversionRecoveryRsPerPiece),
    ("sales", "machine_rate_rs_per_day", SkuField::MachineRateRsPerDay),
    ("sales", "yoy_growth", SkuField::YoyGrowth),
    ("sales", "sales_discount", SkuField::SalesDiscount),
    ("npd", "cavities", SkuField::Cavities),
    ("npd", "cycle_time_seconds", SkuField::CycleTimeSeconds),
    ("ops", "operating_hours_per_day", SkuField::OperatingHoursPerDay),
    ("ops", "working_days_per_year", SkuField::WorkingDaysPerYear),
    ("ops", "shifts_per_day", SkuField::ShiftsPerDay),
    ("ops", "oee", SkuField::Oee),
    ("ops", "machine_power_kw", SkuField::MachinePowerKw),
    ("ops", "manpower_per_shift", SkuField::ManpowerPerShift),
    ("ops", "machine_capex_new", SkuField::MachineCapexNew),
    ("ops", "machine_value_old", SkuField::MachineValueOld),
    ("ops", "mould_capex", SkuField::MouldCapex),
    ("ops", "infra_capex", SkuField::InfraCapex),
    ("ops", "machine_life_years", SkuField::MachineLifeYears),
    ("ops", "mould_life_years", SkuField::MouldLifeYears),
    ("ops", "infra_life_years", SkuField::InfraLifeYears),
    ("ops", "working_capital_days", SkuField::WorkingCapitalDays),
    ("costing", "resin_rs_per_kg", SkuField::ResinRsPerKg),
    ("costing", "resin_discount", SkuField::ResinDiscount),
    ("costing", "freight_in_rs_per_kg", SkuField::FreightInRsPerKg),
    ("costing", "wastage", SkuField::Wastage),
    ("costing", "masterbatch_rs_per_kg", SkuField::MasterbatchRsPerKg),
    ("costing", "masterbatch_ratio", SkuField::MasterbatchRatio),
    ("costing", "packaging_rs_per_kg", SkuField::PackagingRsPerKg),
    ("costing", "freight_out_rs_per_kg", SkuField::FreightOutRsPerKg),
    ("costing", "value_add_rs_per_piece", SkuField::ValueAddRsPerPiece),
    ("plant", "manpower_rs_per_shift", SkuField::ManpowerRsPerShift),
    ("plant", "power_rs_per_unit", SkuField::PowerRsPerUnit),
    ("plant", "rm_rs_per_kg", SkuField::PlantRmRsPerKg),
    ("plant", "other_mfg_rs_per_kg", SkuField::OtherMfgRsPerKg),
    ("plant", "plant_sga_rs_per_kg", SkuField::PlantSgaRsPerKg),
    ("plant", "corp_sga_rs_per_kg", SkuField::CorpSgaRsPerKg),
    ("plant", "sga_rs_per_kg", SkuField::SgaRsPerKg),
    ("plant", "conversion_cost_rs_per_kg", SkuField::ConversionCostRsPerKg),
];

const FINANCE_FIELDS: &[(&str, FinanceField)] = &[
    ("debt_share", FinanceField::DebtShare),
    ("cost_of_debt", FinanceField::CostOfDebt),
    ("cost_of_equity", FinanceField::CostOfEquity),
    ("tax_rate", FinanceField::TaxRate),
    ("wacc_override", FinanceField::WaccOverride),
    ("annual_volume_growth", FinanceField::AnnualVolumeGrowth),
    ("debt_tenor_years", FinanceField::DebtTenorYears),
];

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Mutable view of one numeric input.
///
/// Optional inputs read as the value the engine would actually use when
/// they are unset, so relative deltas perturb the effective value.
enum Slot<'a> {
    Value(&'a mut Decimal),
    Optional {
        value: &'a mut Option<Decimal>,
        fallback: Decimal,
    },
    Count(&'a mut u32),
    OptionalCount {
        value: &'a mut Option<u32>,
        fallback: u32,
    },
    Element {
        series: &'a mut Vec<Decimal>,
        index: usize,
    },
}

impl Slot<'_> {
    fn read(&self) -> Decimal {
        match self {
            Slot::Value(v) => **v,
            Slot::Optional { value, fallback } => value.unwrap_or(*fallback),
            Slot::Count(v) => Decimal::from(**v),
            Slot::OptionalCount { value, fallback } => match value {
                Some(v) if *v > 0 => Decimal::from(*v),
                _ => Decimal::from(*fallback),
            },
            Slot::Element { series, index } => {
                series.get(*index).copied().unwrap_or(Decimal::ZERO)
            }
        }
    }

    fn write(self, new_value: Decimal) {
        match self {
            Slot::Value(v) => *v = new_value,
            Slot::Optional { value, .. } => *value = Some(new_value),
            Slot::Count(v) => *v = round_count(new_value),
            Slot::OptionalCount { value, .. } => {
                let n = round_count(new_value);
                *value = if n == 0 { None } else { Some(n) };
            }
            Slot::Element { series, index } => {
                if series.len() <= index {
                    series.resize(index + 1, Decimal::ZERO);
                }
                series[index] = new_value;
            }
        }
    }
}

/// Nearest non-negative integer.
fn round_count(value: Decimal) -> u32 {
    value
        .round()
        .max(Decimal::ZERO)
        .to_u32()
        .unwrap_or(u32::MAX)
}

impl SkuField {
    fn slot<'a>(
        self,
        sku: &'a mut Sku,
        finance: &FinanceAssumptions,
        config: &EngineConfig,
    ) -> Slot<'a> {
        use SkuField::*;
        match self {
            ProductWeightGrams => Slot::Value(&mut sku.sales.product_weight_grams),
            BaseAnnualVolume => Slot::Value(&mut sku.sales.base_annual_volume),
            ConversionRecoveryRsPerPiece => {
                Slot::Value(&mut sku.sales.conversion_recovery_rs_per_piece)
            }
            MachineRateRsPerDay => Slot::Optional {
                value: &mut sku.sales.machine_rate_rs_per_day,
                fallback: Decimal::ZERO,
            },
            YoyGrowth => Slot::Optional {
                value: &mut sku.sales.yoy_growth,
                fallback: finance.annual_volume_growth,
            },
            SalesDiscount => Slot::Value(&mut sku.sales.sales_discount),
            Cavities => Slot::Count(&mut sku.npd.cavities),
            CycleTimeSeconds => Slot::Value(&mut sku.npd.cycle_time_seconds),
            OperatingHoursPerDay => Slot::Optional {
                value: &mut sku.ops.operating_hours_per_day,
                fallback: config.default_hours_per_day,
            },
            WorkingDaysPerYear => Slot::Optional {
                value: &mut sku.ops.working_days_per_year,
                fallback: config.default_days_per_year,
            },
            ShiftsPerDay => Slot::Optional {
                value: &mut sku.ops.shifts_per_day,
                fallback: config.default_shifts_per_day,
            },
            Oee => Slot::Value(&mut sku.ops.oee),
            MachinePowerKw => Slot::Value(&mut sku.ops.machine_power_kw),
            ManpowerPerShift => Slot::Value(&mut sku.ops.manpower_per_shift),
            MachineCapexNew => Slot::Value(&mut sku.ops.machine_capex_new),
            MachineValueOld => Slot::Value(&mut sku.ops.machine_value_old),
            MouldCapex => Slot::Value(&mut sku.ops.mould_capex),
            InfraCapex => Slot::Value(&mut sku.ops.infra_capex),
            MachineLifeYears => Slot::OptionalCount {
                value: &mut sku.ops.machine_life_years,
                fallback: config.default_machine_life_years,
            },
            MouldLifeYears => Slot::OptionalCount {
                value: &mut sku.ops.mould_life_years,
                fallback: config.default_mould_life_years,
            },
            InfraLifeYears => Slot::OptionalCount {
                value: &mut sku.ops.infra_life_years,
                fallback: config.default_infra_life_years,
            },
            WorkingCapitalDays => Slot::Value(&mut sku.ops.working_capital_days),
            ResinRsPerKg => Slot::Value(&mut sku.costing.resin_rs_per_kg),
            ResinDiscount => Slot::Value(&mut sku.costing.resin_discount),
            FreightInRsPerKg => Slot::Value(&mut sku.costing.freight_in_rs_per_kg),
            Wastage => Slot::Value(&mut sku.costing.wastage),
            MasterbatchRsPerKg => Slot::Value(&mut sku.costing.masterbatch_rs_per_kg),
            MasterbatchRatio => Slot::Value(&mut sku.costing.masterbatch_ratio),
            PackagingRsPerKg => Slot::Value(&mut sku.costing.packaging_rs_per_kg),
            FreightOutRsPerKg => Slot::Value(&mut sku.costing.freight_out_rs_per_kg),
            ValueAddRsPerPiece => Slot::Value(&mut sku.costing.value_add_rs_per_piece),
            ConversionInflation(index) => Slot::Element {
                series: &mut sku.costing.conversion_inflation,
                index,
            },
            RmInflation(index) => Slot::Element {
                series: &mut sku.costing.rm_inflation,
                index,
            },
            ManpowerRsPerShift => Slot::Value(&mut sku.plant.manpower_rs_per_shift),
            PowerRsPerUnit => Slot::Value(&mut sku.plant.power_rs_per_unit),
            PlantRmRsPerKg => Slot::Value(&mut sku.plant.rm_rs_per_kg),
            OtherMfgRsPerKg => Slot::Value(&mut sku.plant.other_mfg_rs_per_kg),
            PlantSgaRsPerKg => Slot::Value(&mut sku.plant.plant_sga_rs_per_kg),
            CorpSgaRsPerKg => Slot::Value(&mut sku.plant.corp_sga_rs_per_kg),
            SgaRsPerKg => Slot::Value(&mut sku.plant.sga_rs_per_kg),
            ConversionCostRsPerKg => Slot::Value(&mut sku.plant.conversion_cost_rs_per_kg),
        }
    }
}

impl FinanceField {
    fn slot<'a>(self, finance: &'a mut FinanceAssumptions, config: &EngineConfig) -> Slot<'a> {
        match self {
            FinanceField::DebtShare => Slot::Optional {
                value: &mut finance.debt_share,
                fallback: Decimal::ZERO,
            },
            FinanceField::CostOfDebt => Slot::Optional {
                value: &mut finance.cost_of_debt,
                fallback: Decimal::ZERO,
            },
            FinanceField::CostOfEquity => Slot::Optional {
                value: &mut finance.cost_of_equity,
                fallback: Decimal::ZERO,
            },
            FinanceField::TaxRate => Slot::Optional {
                value: &mut finance.tax_rate,
                fallback: config.default_tax_rate,
            },
            FinanceField::WaccOverride => {
                let fallback = resolve_wacc(finance, config);
                Slot::Optional {
                    value: &mut finance.wacc_override,
                    fallback,
                }
            }
            FinanceField::AnnualVolumeGrowth => Slot::Value(&mut finance.annual_volume_growth),
            FinanceField::DebtTenorYears => Slot::OptionalCount {
                value: &mut finance.debt_tenor_years,
                fallback: 0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterPath
// ---------------------------------------------------------------------------

/// A resolved reference to one mutable numeric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterPath {
    Sku { index: usize, field: SkuField },
    Finance(FinanceField),
}

impl ParameterPath {
    /// Current (effective) value of the parameter in `case`.
    pub fn get(&self, case: &BusinessCase, config: &EngineConfig) -> SkuFinanceResult<Decimal> {
        match self {
            ParameterPath::Sku { index, field } => {
                let mut sku = self.sku_at(case, *index)?.clone();
                Ok(field.slot(&mut sku, &case.finance, config).read())
            }
            ParameterPath::Finance(field) => {
                let mut finance = case.finance.clone();
                Ok(field.slot(&mut finance, config).read())
            }
        }
    }

    /// Overwrite the parameter in `case`.
    pub fn set(
        &self,
        case: &mut BusinessCase,
        config: &EngineConfig,
        value: Decimal,
    ) -> SkuFinanceResult<()> {
        match self {
            ParameterPath::Sku { index, field } => {
                self.sku_at(case, *index)?;
                let BusinessCase { skus, finance, .. } = case;
                field.slot(&mut skus[*index], finance, config).write(value);
            }
            ParameterPath::Finance(field) => {
                field.slot(&mut case.finance, config).write(value);
            }
        }
        Ok(())
    }

    /// Replace the value with `f(current)` and return the value written.
    pub fn update(
        &self,
        case: &mut BusinessCase,
        config: &EngineConfig,
        f: impl FnOnce(Decimal) -> Decimal,
    ) -> SkuFinanceResult<Decimal> {
        let next = f(self.get(case, config)?);
        self.set(case, config, next)?;
        self.get(case, config)
    }

    /// Value the parameter would hold after `set(value)`, with counts rounded
    /// and a zero optional count falling back to its default.
    pub fn written_value(
        &self,
        case: &BusinessCase,
        config: &EngineConfig,
        value: Decimal,
    ) -> SkuFinanceResult<Decimal> {
        match self {
            ParameterPath::Sku { index, field } => {
                let mut sku = self.sku_at(case, *index)?.clone();
                field.slot(&mut sku, &case.finance, config).write(value);
                Ok(field.slot(&mut sku, &case.finance, config).read())
            }
            ParameterPath::Finance(field) => {
                let mut finance = case.finance.clone();
                field.slot(&mut finance, config).write(value);
                Ok(field.slot(&mut finance, config).read())
            }
        }
    }

    /// Fails when the path points at a SKU the case does not have.
    pub fn check(&self, case: &BusinessCase) -> SkuFinanceResult<()> {
        match self {
            ParameterPath::Sku { index, .. } => self.sku_at(case, *index).map(|_| ()),
            ParameterPath::Finance(_) => Ok(()),
        }
    }

    fn sku_at<'a>(&self, case: &'a BusinessCase, index: usize) -> SkuFinanceResult<&'a Sku> {
        case.skus
            .get(index)
            .ok_or_else(|| SkuFinanceError::UnknownParameter {
                path: self.to_string(),
                reason: format!("case has {} SKU(s)", case.skus.len()),
            })
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterPath::Sku { index, field } => match field {
                SkuField::ConversionInflation(i) => {
                    write!(f, "skus.{index}.costing.conversion_inflation.{i}")
                }
                SkuField::RmInflation(i) => write!(f, "skus.{index}.costing.rm_inflation.{i}"),
                _ => {
                    let (group, name, _) = SKU_FIELDS
                        .iter()
                        .find(|(_, _, v)| v == field)
                        .ok_or(fmt::Error)?;
                    write!(f, "skus.{index}.{group}.{name}")
                }
            },
            ParameterPath::Finance(field) => {
                let (name, _) = FINANCE_FIELDS
                    .iter()
                    .find(|(_, v)| v == field)
                    .ok_or(fmt::Error)?;
                write!(f, "finance.{name}")
            }
        }
    }
}

impl FromStr for ParameterPath {
    type Err = SkuFinanceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let unknown = |reason: &str| SkuFinanceError::UnknownParameter {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<String> = raw.trim().split('.').map(normalise_segment).collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

        match parts.as_slice() {
            ["skus", index, group, field, rest @ ..] => {
                let index: usize = index
                    .parse()
                    .map_err(|_| unknown("SKU index must be a non-negative integer"))?;
                let group = canonical_group(group).ok_or_else(|| unknown("unknown input group"))?;
                let field = parse_sku_field(group, field, rest).map_err(|r| unknown(&r))?;
                Ok(ParameterPath::Sku { index, field })
            }
            ["finance", field] => FINANCE_FIELDS
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, f)| ParameterPath::Finance(*f))
                .ok_or_else(|| unknown("unknown finance field")),
            _ => Err(unknown(
                "expected skus.<index>.<group>.<field> or finance.<field>",
            )),
        }
    }
}

fn parse_sku_field(group: &str, field: &str, rest: &[&str]) -> Result<SkuField, String> {
    if group == "costing" && (field == "conversion_inflation" || field == "rm_inflation") {
        let index: usize = match rest {
            [i] => i
                .parse()
                .map_err(|_| "series index must be a non-negative integer".to_string())?,
            _ => return Err(format!("{field} needs a year index")),
        };
        if index > MAX_SERIES_INDEX {
            return Err(format!("series index must be at most {MAX_SERIES_INDEX}"));
        }
        return Ok(if field == "rm_inflation" {
            SkuField::RmInflation(index)
        } else {
            SkuField::ConversionInflation(index)
        });
    }
    if !rest.is_empty() {
        return Err("trailing path segments".into());
    }
    SKU_FIELDS
        .iter()
        .find(|(g, name, _)| *g == group && *name == field)
        .map(|(_, _, f)| *f)
        .ok_or_else(|| format!("unknown {group} field"))
}

fn canonical_group(group: &str) -> Option<&'static str> {
    match group {
        "sales" | "sales_inputs" => Some("sales"),
        "npd" | "npd_inputs" => Some("npd"),
        "ops" | "ops_inputs" | "operations" => Some("ops"),
        "costing" | "costing_inputs" => Some("costing"),
        "plant" | "plant_master" => Some("plant"),
        _ => None,
    }
}

/// camelCase to snake_case; `resinRsPerKg` becomes `resin_rs_per_kg`.
fn normalise_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, c) in segment.trim().chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::sample_case;
    use rust_decimal_macros::dec;

    fn parse(s: &str) -> ParameterPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_snake_and_camel() {
        let a = parse("skus.0.costing.resin_rs_per_kg");
        let b = parse("skus.0.costing.resinRsPerKg");
        assert_eq!(a, b);
        assert_eq!(
            a,
            ParameterPath::Sku {
                index: 0,
                field: SkuField::ResinRsPerKg
            }
        );
        assert_eq!(parse("finance.taxRate"), ParameterPath::Finance(FinanceField::TaxRate));
    }

    #[test]
    fn test_display_round_trips() {
        for raw in [
            "skus.2.ops.oee",
            "skus.0.costing.rm_inflation.3",
            "skus.1.plant.rm_rs_per_kg",
            "finance.wacc_override",
        ] {
            assert_eq!(parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_unknown_names_rejected_at_parse() {
        for raw in [
            "skus.0.costing.unobtainium",
            "skus.0.nothing.oee",
            "finance.magic",
            "skus.x.ops.oee",
            "skus.0.costing.rm_inflation",
            "skus.0.ops.oee.1",
            "",
        ] {
            let err = raw.parse::<ParameterPath>().unwrap_err();
            assert!(
                matches!(err, SkuFinanceError::UnknownParameter { .. }),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_sku_rejected_on_apply() {
        let mut case = sample_case();
        let path = parse("skus.5.ops.oee");
        let config = EngineConfig::default();
        assert!(path.get(&case, &config).is_err());
        assert!(path.set(&mut case, &config, dec!(0.5)).is_err());
    }

    #[test]
    fn test_get_and_set_plain() {
        let mut case = sample_case();
        let config = EngineConfig::default();
        let path = parse("skus.0.costing.resin_rs_per_kg");
        assert_eq!(path.get(&case, &config).unwrap(), dec!(80));
        let written = path.update(&mut case, &config, |v| v * dec!(1.1)).unwrap();
        assert_eq!(written, dec!(88));
        assert_eq!(case.skus[0].costing.resin_rs_per_kg, dec!(88));
    }

    #[test]
    fn test_optional_reads_effective_value() {
        let mut case = sample_case();
        let config = EngineConfig::default();
        let hours = parse("skus.0.ops.operating_hours_per_day");
        assert_eq!(hours.get(&case, &config).unwrap(), dec!(24));
        hours.set(&mut case, &config, dec!(16)).unwrap();
        assert_eq!(case.skus[0].ops.operating_hours_per_day, Some(dec!(16)));

        let wacc = parse("finance.wacc_override");
        assert_eq!(wacc.get(&case, &config).unwrap(), dec!(0.117));
    }

    #[test]
    fn test_counts_round() {
        let mut case = sample_case();
        let config = EngineConfig::default();
        let cavities = parse("skus.0.npd.cavities");
        assert_eq!(cavities.written_value(&case, &config, dec!(4.6)).unwrap(), dec!(5));
        assert_eq!(case.skus[0].npd.cavities, 4);
        cavities.set(&mut case, &config, dec!(4.6)).unwrap();
        assert_eq!(case.skus[0].npd.cavities, 5);
        cavities.set(&mut case, &config, dec!(-3)).unwrap();
        assert_eq!(case.skus[0].npd.cavities, 0);
    }

    #[test]
    fn test_series_element_extends() {
        let mut case = sample_case();
        let config = EngineConfig::default();
        let path = parse("skus.0.costing.rm_inflation.3");
        assert_eq!(path.get(&case, &config).unwrap(), Decimal::ZERO);
        path.set(&mut case, &config, dec!(0.05)).unwrap();
        assert_eq!(
            case.skus[0].costing.rm_inflation,
            vec![dec!(0), dec!(0), dec!(0), dec!(0.05)]
        );
    }
}
