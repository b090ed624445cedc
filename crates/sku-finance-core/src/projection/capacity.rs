use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::business_case::Sku;
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::types::{Kg, Pieces};
use crate::SkuFinanceResult;

use super::units::grams_to_kg;

/// Theoretical throughput of the SKU's tool on its machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub units_per_hour: Pieces,
    pub units_per_day: Pieces,
    pub annual_capacity: Pieces,
    pub annual_capacity_kg: Kg,
    pub hours_per_day: Decimal,
    pub days_per_year: Decimal,
    pub shifts_per_day: Decimal,
}

/// Throughput from tool and machine parameters:
/// `units/hour = cavities × (60 / cycle_time_seconds) × oee`.
///
/// A non-positive cycle time (or zero cavities) is a configuration error,
/// never clamped here.
pub fn throughput(
    cavities: u32,
    cycle_time_seconds: Decimal,
    oee: Decimal,
    hours_per_day: Decimal,
    days_per_year: Decimal,
) -> SkuFinanceResult<(Pieces, Pieces, Pieces)> {
    if cavities == 0 {
        return Err(SkuFinanceError::InvalidInput {
            field: "npd.cavities".into(),
            reason: "Cavity count must be positive".into(),
        });
    }
    if cycle_time_seconds <= Decimal::ZERO {
        return Err(SkuFinanceError::InvalidInput {
            field: "npd.cycle_time_seconds".into(),
            reason: "Cycle time must be positive".into(),
        });
    }

    let units_per_hour = Decimal::from(cavities) * (dec!(60) / cycle_time_seconds) * oee;
    let units_per_day = units_per_hour * hours_per_day;
    let annual_capacity = units_per_day * days_per_year;
    Ok((units_per_hour, units_per_day, annual_capacity))
}

/// Capacity of one SKU with operating defaults filled from `config`.
pub fn sku_capacity(sku: &Sku, config: &EngineConfig) -> SkuFinanceResult<Capacity> {
    let hours_per_day = sku
        .ops
        .operating_hours_per_day
        .unwrap_or(config.default_hours_per_day);
    let days_per_year = sku
        .ops
        .working_days_per_year
        .unwrap_or(config.default_days_per_year);
    let shifts_per_day = sku
        .ops
        .shifts_per_day
        .unwrap_or(config.default_shifts_per_day);

    let (units_per_hour, units_per_day, annual_capacity) = throughput(
        sku.npd.cavities,
        sku.npd.cycle_time_seconds,
        sku.ops.oee,
        hours_per_day,
        days_per_year,
    )?;

    Ok(Capacity {
        units_per_hour,
        units_per_day,
        annual_capacity,
        annual_capacity_kg: annual_capacity * grams_to_kg(sku.sales.product_weight_grams),
        hours_per_day,
        days_per_year,
        shifts_per_day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::sample_sku;

    #[test]
    fn test_throughput_formula() {
        // 4 cavities × (60/20) × 0.85 = 10.2 units/hr
        let (uph, upd, annual) =
            throughput(4, dec!(20), dec!(0.85), dec!(24), dec!(365)).unwrap();
        assert_eq!(uph, dec!(10.2));
        assert_eq!(upd, dec!(244.8));
        assert_eq!(annual, dec!(89352));
    }

    #[test]
    fn test_zero_cycle_time_is_config_error() {
        let result = throughput(4, Decimal::ZERO, dec!(0.85), dec!(24), dec!(365));
        assert!(matches!(result, Err(SkuFinanceError::InvalidInput { .. })));
    }

    #[test]
    fn test_sku_capacity_uses_defaults() {
        let cap = sku_capacity(&sample_sku("A"), &EngineConfig::default()).unwrap();
        assert_eq!(cap.hours_per_day, dec!(24));
        assert_eq!(cap.days_per_year, dec!(365));
        assert_eq!(cap.shifts_per_day, dec!(3));
        // 89 352 pcs × 0.1 kg
        assert_eq!(cap.annual_capacity_kg, dec!(8935.2));
    }

    #[test]
    fn test_sku_capacity_respects_overrides() {
        let mut sku = sample_sku("A");
        sku.ops.operating_hours_per_day = Some(dec!(16));
        sku.ops.working_days_per_year = Some(dec!(300));
        let cap = sku_capacity(&sku, &EngineConfig::default()).unwrap();
        assert_eq!(cap.units_per_day, dec!(10.2) * dec!(16));
        assert_eq!(cap.annual_capacity, dec!(10.2) * dec!(16) * dec!(300));
    }
}
