pub mod capital;
pub mod cashflow;
pub mod wacc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::business_case::FinanceAssumptions;
use crate::config::EngineConfig;
use crate::projection::pnl::PnlYear;
use crate::time_value::{irr, payback_period};
use crate::types::{Money, Rate, Years};
use crate::SkuFinanceResult;

pub use capital::{roce_schedule, RoceYear};
pub use cashflow::{build_cashflow, CashflowYear};
pub use wacc::resolve_wacc;

/// Investment returns of a SKU or the whole case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsSummary {
    pub wacc: Rate,
    pub npv: Money,
    /// `None` when the solver finds no rate
    pub irr: Option<Rate>,
    /// `None` when cumulative cash never recovers within the horizon
    pub payback_years: Option<Years>,
    pub roce: Vec<RoceYear>,
}

/// Capital invested up front, the base for net block and debt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalBase {
    pub initial_capex: Money,
    pub working_capital_days: Decimal,
}

/// Cash flow table and summary metrics for a P&L series.
pub fn compute_returns(
    pnl: &[PnlYear],
    capital: CapitalBase,
    finance: &FinanceAssumptions,
    config: &EngineConfig,
) -> SkuFinanceResult<(Vec<CashflowYear>, ReturnsSummary)> {
    let wacc = resolve_wacc(finance, config);
    let cashflow = build_cashflow(
        pnl,
        capital.initial_capex,
        capital.working_capital_days,
        wacc,
    )?;

    let flows: Vec<Money> = cashflow.iter().map(|c| c.fcf).collect();
    let summary = ReturnsSummary {
        wacc,
        npv: cashflow.iter().map(|c| c.pv).sum(),
        irr: irr(&flows, config.irr_guess),
        payback_years: payback_period(&flows),
        roce: roce_schedule(pnl, &cashflow, capital.initial_capex),
    };

    Ok((cashflow, summary))
}
