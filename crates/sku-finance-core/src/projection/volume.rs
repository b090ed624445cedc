use std::ops::AddAssign;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::business_case::{FinanceAssumptions, Sku};
use crate::error::SkuFinanceError;
use crate::types::{Kg, Pieces, Rate};
use crate::SkuFinanceResult;

use super::units::{compound, grams_to_kg};

/// Volume of one year, in pieces and kilograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearVolumes {
    pub year: u32,
    pub pieces: Pieces,
    pub weight_kg: Kg,
}

impl AddAssign<&YearVolumes> for YearVolumes {
    fn add_assign(&mut self, other: &YearVolumes) {
        self.pieces += other.pieces;
        self.weight_kg += other.weight_kg;
    }
}

/// Growth rate applied to a SKU: its own override, else the case-level rate.
pub fn sku_growth(sku: &Sku, finance: &FinanceAssumptions) -> Rate {
    sku.sales.yoy_growth.unwrap_or(finance.annual_volume_growth)
}

/// Year 1 is the base volume; each later year compounds on the previous one.
pub fn project_volumes(
    base_volume: Pieces,
    growth: Rate,
    weight_grams: Decimal,
    years: usize,
) -> SkuFinanceResult<Vec<YearVolumes>> {
    let weight_kg = grams_to_kg(weight_grams);
    let mut out = Vec::with_capacity(years);
    let mut pieces = base_volume;

    for year in 1..=years {
        let overflow = || SkuFinanceError::Overflow {
            context: format!("volume for year {year} at growth {growth}"),
        };
        if year > 1 {
            pieces = compound(pieces, growth).ok_or_else(overflow)?;
        }
        out.push(YearVolumes {
            year: year as u32,
            pieces,
            weight_kg: pieces.checked_mul(weight_kg).ok_or_else(overflow)?,
        });
    }

    Ok(out)
}

pub fn sku_volumes(
    sku: &Sku,
    finance: &FinanceAssumptions,
    years: usize,
) -> SkuFinanceResult<Vec<YearVolumes>> {
    project_volumes(
        sku.sales.base_annual_volume,
        sku_growth(sku, finance),
        sku.sales.product_weight_grams,
        years,
    )
}
