use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Pieces, Rate};

// ---------------------------------------------------------------------------
// Business case
// ---------------------------------------------------------------------------

/// Root aggregate: one or more SKUs sharing a set of finance assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCase {
    pub id: String,
    pub name: String,
    /// Ordered SKU list; must be non-empty with unique ids
    pub skus: Vec<Sku>,
    #[serde(default)]
    pub finance: FinanceAssumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One product line being costed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub sales: SalesInputs,
    pub npd: NpdInputs,
    pub ops: OpsInputs,
    pub costing: CostingInputs,
    /// Denormalised copy of the plant master the SKU is produced in
    #[serde(default)]
    pub plant: PlantMaster,
}

// ---------------------------------------------------------------------------
// Input groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInputs {
    /// Product weight per piece in grams
    pub product_weight_grams: Decimal,
    /// Year-1 volume in pieces
    pub base_annual_volume: Pieces,
    /// Conversion charge recovered per piece; <= 0 means "derive or ignore"
    #[serde(default)]
    pub conversion_recovery_rs_per_piece: Money,
    /// Machine rate per day used to derive the conversion charge when no
    /// explicit per-piece value is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_rate_rs_per_day: Option<Money>,
    /// Per-SKU volume growth; falls back to the business-case growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yoy_growth: Option<Rate>,
    /// Discount deducted from gross revenue
    #[serde(default)]
    pub sales_discount: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpdInputs {
    pub cavities: u32,
    pub cycle_time_seconds: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    /// Links to the plant master copied into [`Sku::plant`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours_per_day: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_days_per_year: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shifts_per_day: Option<Decimal>,
    /// Overall equipment effectiveness, 0..=1
    pub oee: Rate,
    /// Connected load of the machine, kW
    #[serde(default)]
    pub machine_power_kw: Decimal,
    /// Operators required per shift
    #[serde(default)]
    pub manpower_per_shift: Decimal,
    #[serde(default)]
    pub machine_capex_new: Money,
    /// Transfer value of an existing machine allocated to this SKU
    #[serde(default)]
    pub machine_value_old: Money,
    #[serde(default)]
    pub mould_capex: Money,
    #[serde(default)]
    pub infra_capex: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_life_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mould_life_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_life_years: Option<u32>,
    #[serde(default)]
    pub working_capital_days: Decimal,
}

impl OpsInputs {
    /// Every capitalised amount: new machine, old machine value, mould, infra.
    pub fn total_capex(&self) -> Money {
        self.machine_capex_new + self.machine_value_old + self.mould_capex + self.infra_capex
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostingInputs {
    pub resin_rs_per_kg: Money,
    #[serde(default)]
    pub resin_discount: Rate,
    #[serde(default)]
    pub freight_in_rs_per_kg: Money,
    #[serde(default)]
    pub wastage: Rate,
    #[serde(default)]
    pub masterbatch_rs_per_kg: Money,
    /// Price masterbatch at `masterbatch_rs_per_kg` instead of the net resin price
    #[serde(default)]
    pub use_mb_override: bool,
    #[serde(default)]
    pub masterbatch_ratio: Rate,
    #[serde(default)]
    pub packaging_rs_per_kg: Money,
    #[serde(default)]
    pub freight_out_rs_per_kg: Money,
    #[serde(default)]
    pub value_add_rs_per_piece: Money,
    /// Yearly conversion-cost inflation; index 0 is year 1 (conventionally 0)
    #[serde(default)]
    pub conversion_inflation: Vec<Rate>,
    /// Yearly raw-material inflation; index 0 is year 1 (conventionally 0)
    #[serde(default)]
    pub rm_inflation: Vec<Rate>,
}

/// Plant-level rates. Everything except manpower and power is per kg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantMaster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_id: Option<String>,
    pub manpower_rs_per_shift: Money,
    /// Power tariff per kWh
    pub power_rs_per_unit: Money,
    /// Repairs & maintenance
    pub rm_rs_per_kg: Money,
    pub other_mfg_rs_per_kg: Money,
    pub plant_sga_rs_per_kg: Money,
    pub corp_sga_rs_per_kg: Money,
    /// Aggregate SG&A, used when the plant/corporate split is not given
    pub sga_rs_per_kg: Money,
    /// Blended conversion cost, used when no itemised plant driver is given
    pub conversion_cost_rs_per_kg: Money,
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

/// Capex base the opening debt is sized against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtBasis {
    /// Debt share of the new machine only
    NewMachineCapex,
    /// Debt share of every capitalised amount
    #[default]
    TotalCapex,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceAssumptions {
    pub include_corp_sga: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_share: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_of_debt: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_of_equity: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// Explicit discount rate; bypasses the WACC build-up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wacc_override: Option<Rate>,
    pub annual_volume_growth: Rate,
    pub debt_basis: DebtBasis,
    /// Straight-line repayment period; `None` keeps the debt outstanding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_tenor_years: Option<u32>,
}

impl FinanceAssumptions {
    /// True when none of the WACC build-up inputs is set.
    pub fn is_unset(&self) -> bool {
        self.debt_share.is_none()
            && self.cost_of_debt.is_none()
            && self.cost_of_equity.is_none()
            && self.tax_rate.is_none()
    }
}
