use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SkuFinanceError;
use crate::types::Rate;
use crate::SkuFinanceResult;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_HORIZON_YEARS: usize = 10;
pub const DEFAULT_REPORTING_YEARS: usize = 5;
pub const DEFAULT_WACC: Rate = dec!(0.14);
pub const DEFAULT_TAX_RATE: Rate = dec!(0.25);
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.1);
pub const DEFAULT_MAX_BATCH_RUNS: usize = 10_000;

/// Engine-wide settings. Every field has a default, so an empty JSON/YAML
/// document deserialises to [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of projected years (year 1..=horizon)
    pub horizon_years: usize,
    /// Years surfaced to callers; cumulative metrics sum over this window
    pub reporting_years: usize,
    /// Discount rate used when no finance assumption is set at all
    pub default_wacc: Rate,
    /// Tax rate used when the business case leaves it unset
    pub default_tax_rate: Rate,
    pub default_hours_per_day: Decimal,
    pub default_days_per_year: Decimal,
    pub default_shifts_per_day: Decimal,
    pub default_machine_life_years: u32,
    pub default_mould_life_years: u32,
    pub default_infra_life_years: u32,
    /// Newton-Raphson starting point for IRR
    pub irr_guess: Rate,
    /// Upper bound on batch worker threads (None = rayon default)
    pub max_parallelism: Option<usize>,
    /// Largest batch accepted by the scenario layer
    pub max_batch_runs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            reporting_years: DEFAULT_REPORTING_YEARS,
            default_wacc: DEFAULT_WACC,
            default_tax_rate: DEFAULT_TAX_RATE,
            default_hours_per_day: dec!(24),
            default_days_per_year: dec!(365),
            default_shifts_per_day: dec!(3),
            default_machine_life_years: 15,
            default_mould_life_years: 5,
            default_infra_life_years: 30,
            irr_guess: DEFAULT_IRR_GUESS,
            max_parallelism: None,
            max_batch_runs: DEFAULT_MAX_BATCH_RUNS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> SkuFinanceResult<()> {
        if self.horizon_years == 0 {
            return Err(config_error("horizon_years", "Horizon must be at least one year"));
        }
        if self.reporting_years == 0 || self.reporting_years > self.horizon_years {
            return Err(config_error(
                "reporting_years",
                "Reporting years must be between 1 and horizon_years",
            ));
        }
        if self.default_wacc <= dec!(-1) {
            return Err(config_error("default_wacc", "WACC must be greater than -100%"));
        }
        if self.default_tax_rate < Decimal::ZERO || self.default_tax_rate > Decimal::ONE {
            return Err(config_error("default_tax_rate", "Tax rate must be between 0 and 1"));
        }
        if self.default_hours_per_day <= Decimal::ZERO || self.default_hours_per_day > dec!(24) {
            return Err(config_error(
                "default_hours_per_day",
                "Hours per day must be in (0, 24]",
            ));
        }
        if self.default_days_per_year <= Decimal::ZERO || self.default_days_per_year > dec!(366) {
            return Err(config_error(
                "default_days_per_year",
                "Days per year must be in (0, 366]",
            ));
        }
        if self.default_shifts_per_day <= Decimal::ZERO {
            return Err(config_error(
                "default_shifts_per_day",
                "Shifts per day must be positive",
            ));
        }
        if self.default_machine_life_years == 0
            || self.default_mould_life_years == 0
            || self.default_infra_life_years == 0
        {
            return Err(config_error(
                "default_*_life_years",
                "Default useful lives must be at least one year",
            ));
        }
        if self.irr_guess <= dec!(-1) {
            return Err(config_error("irr_guess", "IRR guess must be greater than -100%"));
        }
        if self.max_parallelism == Some(0) {
            return Err(config_error("max_parallelism", "Parallelism must be at least 1"));
        }
        Ok(())
    }
}

fn config_error(field: &str, reason: &str) -> SkuFinanceError {
    SkuFinanceError::InvalidInput {
        field: format!("config.{field}"),
        reason: reason.into(),
    }
}
