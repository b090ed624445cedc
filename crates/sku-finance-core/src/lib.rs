pub mod aggregation;
pub mod business_case;
pub mod calculation;
pub mod config;
pub mod error;
pub mod projection;
pub mod returns;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use business_case::{validate_business_case, BusinessCase};
pub use calculation::{calculate, calculate_case, calculate_with_config, CalcOutput};
pub use config::EngineConfig;
pub use error::SkuFinanceError;
pub use types::*;

/// Standard result type for all sku-finance operations
pub type SkuFinanceResult<T> = Result<T, SkuFinanceError>;
