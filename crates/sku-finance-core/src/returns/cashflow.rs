use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::projection::pnl::PnlYear;
use crate::projection::units::DAYS_IN_YEAR;
use crate::time_value::discount_factor;
use crate::types::{Money, Rate};
use crate::SkuFinanceResult;

/// Free cash flow for one year. Year 0 carries the initial capex only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    pub year: u32,
    pub ebitda: Money,
    pub interest: Money,
    pub tax: Money,
    pub nwc: Money,
    pub change_in_nwc: Money,
    pub capex: Money,
    pub fcf: Money,
    pub discount_factor: Decimal,
    pub pv: Money,
    pub cumulative_fcf: Money,
}

/// Net working capital tied up by a year's net revenue.
pub fn net_working_capital(working_capital_days: Decimal, revenue_net: Money) -> Money {
    working_capital_days / DAYS_IN_YEAR * revenue_net
}

/// Cash flow table: year 0 is the capex outflow, years 1.. are
/// `EBITDA − interest − tax − ΔNWC` discounted at `wacc`.
pub fn build_cashflow(
    pnl: &[PnlYear],
    initial_capex: Money,
    working_capital_days: Decimal,
    wacc: Rate,
) -> SkuFinanceResult<Vec<CashflowYear>> {
    let mut rows = Vec::with_capacity(pnl.len() + 1);

    let year0 = -initial_capex;
    rows.push(CashflowYear {
        year: 0,
        ebitda: Decimal::ZERO,
        interest: Decimal::ZERO,
        tax: Decimal::ZERO,
        nwc: Decimal::ZERO,
        change_in_nwc: Decimal::ZERO,
        capex: initial_capex,
        fcf: year0,
        discount_factor: Decimal::ONE,
        pv: year0,
        cumulative_fcf: year0,
    });

    let mut prev_nwc = Decimal::ZERO;
    let mut cumulative = year0;

    for p in pnl {
        let nwc = net_working_capital(working_capital_days, p.revenue_net);
        let change_in_nwc = nwc - prev_nwc;
        let fcf = p.ebitda - p.interest - p.tax - change_in_nwc;
        let df = discount_factor(wacc, p.year)?;
        cumulative += fcf;

        rows.push(CashflowYear {
            year: p.year,
            ebitda: p.ebitda,
            interest: p.interest,
            tax: p.tax,
            nwc,
            change_in_nwc,
            capex: Decimal::ZERO,
            fcf,
            discount_factor: df,
            pv: fcf * df,
            cumulative_fcf: cumulative,
        });
        prev_nwc = nwc;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(year: u32, revenue_net: Decimal, ebitda: Decimal) -> PnlYear {
        PnlYear {
            year,
            revenue_net,
            ebitda,
            ..PnlYear::default()
        }
    }

    #[test]
    fn test_year_zero_is_capex() {
        let cf = build_cashflow(&[row(1, dec!(365), dec!(50))], dec!(200), dec!(0), dec!(0.1))
            .unwrap();
        assert_eq!(cf[0].fcf, dec!(-200));
        assert_eq!(cf[0].pv, dec!(-200));
        assert_eq!(cf[0].discount_factor, Decimal::ONE);
    }

    #[test]
    fn test_nwc_change_reduces_fcf() {
        let pnl = [row(1, dec!(3650), dec!(500)), row(2, dec!(7300), dec!(500))];
        let cf = build_cashflow(&pnl, dec!(0), dec!(36.5), dec!(0)).unwrap();
        // NWC = 36.5/365 × revenue = 10%
        assert_eq!(cf[1].nwc, dec!(365));
        assert_eq!(cf[1].change_in_nwc, dec!(365));
        assert_eq!(cf[1].fcf, dec!(135));
        assert_eq!(cf[2].change_in_nwc, dec!(365));
        assert_eq!(cf[2].cumulative_fcf, dec!(270));
    }

    #[test]
    fn test_fcf_uses_ebitda_not_ebit() {
        let mut p = row(1, dec!(0), dec!(100));
        p.depreciation = dec!(40);
        p.ebit = dec!(60);
        p.interest = dec!(10);
        p.tax = dec!(5);
        let cf = build_cashflow(&[p], dec!(0), dec!(0), dec!(0)).unwrap();
        assert_eq!(cf[1].fcf, dec!(85));
    }

    #[test]
    fn test_discounting() {
        let cf = build_cashflow(&[row(1, dec!(0), dec!(110))], dec!(0), dec!(0), dec!(0.1))
            .unwrap();
        assert!((cf[1].pv - dec!(100)).abs() < dec!(0.0000001));
    }
}
