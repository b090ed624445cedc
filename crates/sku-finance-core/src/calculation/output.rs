use serde::{Deserialize, Serialize};

use crate::projection::{Capacity, PnlYear, PriceYear, YearVolumes};
use crate::returns::{CashflowYear, ReturnsSummary};

pub use crate::aggregation::{PnlPerKgYear, WeightedPriceYear};

/// Everything one SKU contributes to the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuOutput {
    pub sku_id: String,
    pub sku_name: String,
    pub capacity: Capacity,
    pub volumes: Vec<YearVolumes>,
    /// `prices[0]` is the year-1 build-up quoted to customers
    pub prices: Vec<PriceYear>,
    pub pnl: Vec<PnlYear>,
    pub cashflow: Vec<CashflowYear>,
    pub returns: ReturnsSummary,
}

/// Full result of one business-case calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcOutput {
    pub case_id: String,
    pub case_name: String,
    pub horizon_years: usize,
    pub reporting_years: usize,
    pub volumes: Vec<YearVolumes>,
    pub pnl: Vec<PnlYear>,
    pub cashflow: Vec<CashflowYear>,
    pub returns: ReturnsSummary,
    /// Frozen year-1 mix
    pub weighted_price_per_kg: Vec<WeightedPriceYear>,
    /// Each year's own mix
    pub pnl_per_kg: Vec<PnlPerKgYear>,
    pub by_sku: Vec<SkuOutput>,
}
