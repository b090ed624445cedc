pub mod capacity;
pub mod pnl;
pub mod pricing;
pub mod units;
pub mod volume;

pub use capacity::{sku_capacity, Capacity};
pub use pnl::{build_pnl, PnlYear};
pub use pricing::{build_prices, PriceComponents, PriceYear};
pub use volume::{sku_volumes, YearVolumes};
