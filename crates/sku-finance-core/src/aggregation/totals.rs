use std::ops::AddAssign;

use rust_decimal::Decimal;

use crate::business_case::Sku;
use crate::projection::pnl::PnlYear;
use crate::projection::volume::YearVolumes;
use crate::types::Money;

/// Field-wise sum of per-SKU series, one entry per year.
fn sum_by_year<T>(series: &[Vec<T>], years: usize, blank: impl Fn(u32) -> T) -> Vec<T>
where
    T: for<'a> AddAssign<&'a T>,
{
    (0..years)
        .map(|idx| {
            let mut total = blank(idx as u32 + 1);
            for row in series.iter().filter_map(|s| s.get(idx)) {
                total += row;
            }
            total
        })
        .collect()
}

pub fn total_volumes(per_sku: &[Vec<YearVolumes>], years: usize) -> Vec<YearVolumes> {
    sum_by_year(per_sku, years, |year| YearVolumes {
        year,
        ..YearVolumes::default()
    })
}

pub fn total_pnl(per_sku: &[Vec<PnlYear>], years: usize) -> Vec<PnlYear> {
    sum_by_year(per_sku, years, |year| PnlYear {
        year,
        ..PnlYear::default()
    })
}

/// Working-capital days of the merged case: the longest cycle of any SKU.
pub fn aggregate_working_capital_days(skus: &[Sku]) -> Decimal {
    skus.iter()
        .map(|s| s.ops.working_capital_days)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Year-0 outlay of the case; also the capitalised investment base.
pub fn aggregate_capex(skus: &[Sku]) -> Money {
    skus.iter().map(|s| s.ops.total_capex()).sum()
}
