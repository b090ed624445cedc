pub mod totals;
pub mod weighted;

pub use totals::{aggregate_capex, aggregate_working_capital_days, total_pnl, total_volumes};
pub use weighted::{
    pnl_per_kg, weighted_average, weighted_price_per_kg, PnlPerKgYear, WeightedPriceYear,
    WeightingPolicy,
};
