use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::CalcOutput;
use crate::error::SkuFinanceError;

/// Outcome metrics the scenario layer can extract from a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMetric {
    Npv,
    Irr,
    PaybackYears,
    Wacc,
    Year1Revenue,
    Year1Ebitda,
    Year1EbitdaMargin,
    Year1Pat,
    CumulativePat,
    CumulativeFcf,
    Year1PricePerKg,
    Year1Roce,
    AverageRoce,
}

/// Metric values of one run; `None` marks an undefined value (e.g. IRR
/// without a sign change), never zero.
pub type MetricValues = BTreeMap<ObjectiveMetric, Option<Decimal>>;

impl ObjectiveMetric {
    pub const ALL: [ObjectiveMetric; 13] = [
        ObjectiveMetric::Npv,
        ObjectiveMetric::Irr,
        ObjectiveMetric::PaybackYears,
        ObjectiveMetric::Wacc,
        ObjectiveMetric::Year1Revenue,
        ObjectiveMetric::Year1Ebitda,
        ObjectiveMetric::Year1EbitdaMargin,
        ObjectiveMetric::Year1Pat,
        ObjectiveMetric::CumulativePat,
        ObjectiveMetric::CumulativeFcf,
        ObjectiveMetric::Year1PricePerKg,
        ObjectiveMetric::Year1Roce,
        ObjectiveMetric::AverageRoce,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveMetric::Npv => "npv",
            ObjectiveMetric::Irr => "irr",
            ObjectiveMetric::PaybackYears => "payback_years",
            ObjectiveMetric::Wacc => "wacc",
            ObjectiveMetric::Year1Revenue => "year1_revenue",
            ObjectiveMetric::Year1Ebitda => "year1_ebitda",
            ObjectiveMetric::Year1EbitdaMargin => "year1_ebitda_margin",
            ObjectiveMetric::Year1Pat => "year1_pat",
            ObjectiveMetric::CumulativePat => "cumulative_pat",
            ObjectiveMetric::CumulativeFcf => "cumulative_fcf",
            ObjectiveMetric::Year1PricePerKg => "year1_price_per_kg",
            ObjectiveMetric::Year1Roce => "year1_roce",
            ObjectiveMetric::AverageRoce => "average_roce",
        }
    }

    /// Read this metric from a finished calculation. Cumulative and average
    /// metrics cover the reporting window only.
    pub fn extract(&self, out: &CalcOutput) -> Option<Decimal> {
        let window = out.reporting_years.min(out.pnl.len());
        let year1 = out.pnl.first();

        match self {
            ObjectiveMetric::Npv => Some(out.returns.npv),
            ObjectiveMetric::Irr => out.returns.irr,
            ObjectiveMetric::PaybackYears => out.returns.payback_years,
            ObjectiveMetric::Wacc => Some(out.returns.wacc),
            ObjectiveMetric::Year1Revenue => year1.map(|p| p.revenue_net),
            ObjectiveMetric::Year1Ebitda => year1.map(|p| p.ebitda),
            ObjectiveMetric::Year1EbitdaMargin => year1
                .filter(|p| !p.revenue_net.is_zero())
                .map(|p| p.ebitda / p.revenue_net),
            ObjectiveMetric::Year1Pat => year1.map(|p| p.pat),
            ObjectiveMetric::CumulativePat => Some(out.pnl[..window].iter().map(|p| p.pat).sum()),
            ObjectiveMetric::CumulativeFcf => out.cashflow.get(window).map(|c| c.cumulative_fcf),
            ObjectiveMetric::Year1PricePerKg => {
                out.weighted_price_per_kg.first().map(|w| w.per_kg.total)
            }
            ObjectiveMetric::Year1Roce => out.returns.roce.first().map(|r| r.roce),
            ObjectiveMetric::AverageRoce => {
                let roce = &out.returns.roce[..window.min(out.returns.roce.len())];
                if roce.is_empty() {
                    None
                } else {
                    let total: Decimal = roce.iter().map(|r| r.roce).sum();
                    Some(total / Decimal::from(roce.len() as u64))
                }
            }
        }
    }
}

impl fmt::Display for ObjectiveMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectiveMetric {
    type Err = SkuFinanceError;

    /// Accepts the snake_case name or its camelCase spelling
    /// (`year1Pat`, `cumulativeFcf`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ObjectiveMetric::ALL
            .iter()
            .find(|m| m.name().replace('_', "") == wanted)
            .copied()
            .ok_or_else(|| SkuFinanceError::InvalidInput {
                field: "metrics".into(),
                reason: format!("unknown objective metric '{s}'"),
            })
    }
}

/// Extract `metrics` from `out`.
pub fn extract_metrics(out: &CalcOutput, metrics: &[ObjectiveMetric]) -> MetricValues {
    metrics.iter().map(|m| (*m, m.extract(out))).collect()
}

/// Every requested metric marked undefined, for runs that failed.
pub fn undefined_metrics(metrics: &[ObjectiveMetric]) -> MetricValues {
    metrics.iter().map(|m| (*m, None)).collect()
}
