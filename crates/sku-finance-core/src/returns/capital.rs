use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::projection::pnl::PnlYear;
use crate::types::{Money, Rate};

use super::cashflow::CashflowYear;

/// Return on capital employed for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoceYear {
    pub year: u32,
    pub ebit: Money,
    pub net_block: Money,
    pub nwc: Money,
    pub capital_employed: Money,
    pub roce: Rate,
}

/// Capitalised investment less accumulated depreciation, floored at zero.
pub fn net_block_schedule(capitalised: Money, depreciation: &[Money]) -> Vec<Money> {
    let mut accumulated = Decimal::ZERO;
    depreciation
        .iter()
        .map(|d| {
            accumulated += d;
            (capitalised - accumulated).max(Decimal::ZERO)
        })
        .collect()
}

/// `EBIT / (net block + NWC)`; zero whenever capital employed is not positive.
pub fn roce(ebit: Money, capital_employed: Money) -> Rate {
    if capital_employed <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        ebit / capital_employed
    }
}

/// RoCE by year. `cashflow` includes the year-0 row.
pub fn roce_schedule(pnl: &[PnlYear], cashflow: &[CashflowYear], capitalised: Money) -> Vec<RoceYear> {
    let depreciation: Vec<Money> = pnl.iter().map(|p| p.depreciation).collect();
    let net_block = net_block_schedule(capitalised, &depreciation);

    pnl.iter()
        .zip(net_block)
        .zip(cashflow.iter().skip(1))
        .map(|((p, net_block), cf)| {
            let capital_employed = net_block + cf.nwc;
            RoceYear {
                year: p.year,
                ebit: p.ebit,
                net_block,
                nwc: cf.nwc,
                capital_employed,
                roce: roce(p.ebit, capital_employed),
            }
        })
        .collect()
}
