use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::projection::pnl::PnlYear;
use crate::projection::pricing::{PriceComponents, PriceYear};
use crate::projection::units::safe_divide_positive;
use crate::projection::volume::YearVolumes;
use crate::types::{Kg, Money};

/// How SKU weight shares are chosen when averaging a per-kg metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Each year uses that year's weight share, so the mix can drift
    PerYear,
    /// Every year uses the year-1 weight share
    FrozenBaseYear,
}

/// Volume-weighted average price build-up per kg for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPriceYear {
    pub year: u32,
    pub per_kg: PriceComponents,
}

/// Case-level P&L lines per kg for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlPerKgYear {
    pub year: u32,
    pub revenue: Money,
    pub material_margin: Money,
    pub gross_margin: Money,
    pub ebitda: Money,
    pub pat: Money,
}

/// `Σ(v × w) / Σw`, or zero when the weights sum to zero.
pub fn weighted_average(values: &[Decimal], weights: &[Decimal]) -> Decimal {
    let total_weight: Decimal = weights.iter().sum();
    if total_weight.is_zero() {
        return Decimal::ZERO;
    }
    let weighted_sum: Decimal = values
        .iter()
        .zip(weights.iter())
        .map(|(v, w)| *v * *w)
        .sum();
    weighted_sum / total_weight
}

/// Weight of each SKU (outer index) to apply in year `idx` (0-based).
pub fn sku_weights(volumes: &[Vec<YearVolumes>], idx: usize, policy: WeightingPolicy) -> Vec<Kg> {
    let source = match policy {
        WeightingPolicy::PerYear => idx,
        WeightingPolicy::FrozenBaseYear => 0,
    };
    volumes
        .iter()
        .map(|series| {
            series
                .get(source)
                .map(|v| v.weight_kg)
                .unwrap_or(Decimal::ZERO)
        })
        .collect()
}

/// Weighted price-per-kg table. Uses the frozen year-1 mix so the per-kg
/// view is not distorted by SKUs growing at different rates.
pub fn weighted_price_per_kg(
    volumes: &[Vec<YearVolumes>],
    prices: &[Vec<PriceYear>],
    years: usize,
) -> Vec<WeightedPriceYear> {
    (0..years)
        .map(|idx| {
            let weights = sku_weights(volumes, idx, WeightingPolicy::FrozenBaseYear);
            let total_weight: Decimal = weights.iter().sum();
            let mut per_kg = PriceComponents::default();
            if !total_weight.is_zero() {
                for (series, w) in prices.iter().zip(weights.iter()) {
                    if let Some(p) = series.get(idx) {
                        per_kg += &p.per_kg.scaled(*w / total_weight);
                    }
                }
            }
            WeightedPriceYear {
                year: idx as u32 + 1,
                per_kg,
            }
        })
        .collect()
}

/// Case-level P&L per kg. Uses each year's own mix.
pub fn pnl_per_kg(
    volumes: &[Vec<YearVolumes>],
    pnls: &[Vec<PnlYear>],
    years: usize,
) -> Vec<PnlPerKgYear> {
    (0..years)
        .map(|idx| {
            let weights = sku_weights(volumes, idx, WeightingPolicy::PerYear);
            let per_kg = |line: fn(&PnlYear) -> Money| -> Money {
                let values: Vec<Money> = pnls
                    .iter()
                    .zip(volumes.iter())
                    .map(|(pnl, vol)| match (pnl.get(idx), vol.get(idx)) {
                        (Some(p), Some(v)) => safe_divide_positive(line(p), v.weight_kg),
                        _ => Decimal::ZERO,
                    })
                    .collect();
                weighted_average(&values, &weights)
            };
            PnlPerKgYear {
                year: idx as u32 + 1,
                revenue: per_kg(|p| p.revenue_net),
                material_margin: per_kg(|p| p.material_margin),
                gross_margin: per_kg(|p| p.gross_margin),
                ebitda: per_kg(|p| p.ebitda),
                pat: per_kg(|p| p.pat),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn vols(weights: &[Decimal]) -> Vec<YearVolumes> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| YearVolumes {
                year: i as u32 + 1,
                pieces: *w * dec!(10),
                weight_kg: *w,
            })
            .collect()
    }

    fn price(total: Decimal) -> PriceYear {
        PriceYear {
            year: 1,
            price_per_piece: total,
            per_kg: PriceComponents {
                raw_material: total,
                total,
                ..PriceComponents::default()
            },
            per_piece: PriceComponents::default(),
        }
    }

    #[test]
    fn test_weighted_average_basic() {
        let avg = weighted_average(&[dec!(10), dec!(20)], &[dec!(1), dec!(3)]);
        assert_eq!(avg, dec!(17.5));
    }

    #[test]
    fn test_weighted_average_zero_weights() {
        assert_eq!(
            weighted_average(&[dec!(10), dec!(20)], &[dec!(0), dec!(0)]),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_identical_metric_is_split_invariant() {
        let a = weighted_average(&[dec!(42), dec!(42)], &[dec!(1), dec!(999)]);
        let b = weighted_average(&[dec!(42), dec!(42)], &[dec!(500), dec!(500)]);
        assert_eq!(a, dec!(42));
        assert_eq!(b, dec!(42));
    }

    #[test]
    fn test_frozen_and_per_year_weights_differ_under_growth() {
        // SKU A flat, SKU B doubling
        let volumes = vec![
            vols(&[dec!(100), dec!(100)]),
            vols(&[dec!(100), dec!(200)]),
        ];
        let frozen = sku_weights(&volumes, 1, WeightingPolicy::FrozenBaseYear);
        let per_year = sku_weights(&volumes, 1, WeightingPolicy::PerYear);
        assert_eq!(frozen, vec![dec!(100), dec!(100)]);
        assert_eq!(per_year, vec![dec!(100), dec!(200)]);

        let prices = vec![
            vec![price(dec!(90)), price(dec!(90))],
            vec![price(dec!(120)), price(dec!(120))],
        ];
        let table = weighted_price_per_kg(&volumes, &prices, 2);
        // frozen 50/50 mix holds in year 2
        assert_eq!(table[1].per_kg.total, dec!(105));
        assert_eq!(table[1].per_kg.raw_material, dec!(105));
    }

    #[test]
    fn test_pnl_per_kg_uses_each_years_mix() {
        let volumes = vec![
            vols(&[dec!(100), dec!(100)]),
            vols(&[dec!(100), dec!(300)]),
        ];
        let row = |kg: Decimal, rev_per_kg: Decimal| PnlYear {
            revenue_net: kg * rev_per_kg,
            ..PnlYear::default()
        };
        let pnls = vec![
            vec![row(dec!(100), dec!(10)), row(dec!(100), dec!(10))],
            vec![row(dec!(100), dec!(20)), row(dec!(300), dec!(20))],
        ];
        let table = pnl_per_kg(&volumes, &pnls, 2);
        assert_eq!(table[0].revenue, dec!(15));
        // (100 × 10 + 300 × 20) / 400
        assert_eq!(table[1].revenue, dec!(17.5));
    }
}
