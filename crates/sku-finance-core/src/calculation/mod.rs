pub mod engine;
pub mod output;

pub use engine::{calculate, calculate_case, calculate_with_config};
pub use output::{CalcOutput, PnlPerKgYear, SkuOutput, WeightedPriceYear};
