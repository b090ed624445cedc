use std::ops::AddAssign;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::business_case::Sku;
use crate::types::{Kg, Money};
use crate::SkuFinanceResult;

use super::capacity::Capacity;
use super::units::{grams_to_kg, inflation_factors, safe_divide_positive};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Price build-up, either per kg or per piece depending on context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceComponents {
    pub raw_material: Money,
    pub masterbatch: Money,
    pub value_add: Money,
    pub packaging: Money,
    pub freight_out: Money,
    pub conversion: Money,
    pub total: Money,
}

impl PriceComponents {
    fn from_parts(
        raw_material: Money,
        masterbatch: Money,
        value_add: Money,
        packaging: Money,
        freight_out: Money,
        conversion: Money,
    ) -> Self {
        Self {
            raw_material,
            masterbatch,
            value_add,
            packaging,
            freight_out,
            conversion,
            total: raw_material + masterbatch + value_add + packaging + freight_out + conversion,
        }
    }

    /// Every component multiplied by `factor`.
    pub fn scaled(&self, factor: Decimal) -> Self {
        Self {
            raw_material: self.raw_material * factor,
            masterbatch: self.masterbatch * factor,
            value_add: self.value_add * factor,
            packaging: self.packaging * factor,
            freight_out: self.freight_out * factor,
            conversion: self.conversion * factor,
            total: self.total * factor,
        }
    }
}

impl AddAssign<&PriceComponents> for PriceComponents {
    fn add_assign(&mut self, other: &PriceComponents) {
        self.raw_material += other.raw_material;
        self.masterbatch += other.masterbatch;
        self.value_add += other.value_add;
        self.packaging += other.packaging;
        self.freight_out += other.freight_out;
        self.conversion += other.conversion;
        self.total += other.total;
    }
}

/// Unit economics of one SKU in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceYear {
    pub year: u32,
    pub price_per_piece: Money,
    pub per_kg: PriceComponents,
    pub per_piece: PriceComponents,
}

/// Year-1 unit costs before any inflation factor is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBaseline {
    pub weight_kg: Kg,
    /// Resin after discount plus inbound freight
    pub resin_net_rs_per_kg: Money,
    pub raw_material_rs_per_kg: Money,
    pub masterbatch_rs_per_kg: Money,
    pub packaging_rs_per_kg: Money,
    pub freight_out_rs_per_kg: Money,
    pub value_add_rs_per_piece: Money,
    pub conversion_rs_per_piece: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Conversion charge per piece: the explicit value when set, else the
/// machine day rate spread over the pieces the tool makes in a day.
pub fn conversion_recovery_per_piece(sku: &Sku, capacity: &Capacity) -> Money {
    let explicit = sku.sales.conversion_recovery_rs_per_piece;
    if explicit > Decimal::ZERO {
        return explicit;
    }
    match sku.sales.machine_rate_rs_per_day {
        Some(rate) if rate > Decimal::ZERO => safe_divide_positive(rate, capacity.units_per_day),
        _ => Decimal::ZERO,
    }
}

pub fn price_baseline(sku: &Sku, capacity: &Capacity) -> PriceBaseline {
    let c = &sku.costing;
    let wastage_gross_up = Decimal::ONE + c.wastage;

    let resin_net = (c.resin_rs_per_kg * (Decimal::ONE - c.resin_discount)).max(Decimal::ZERO)
        + c.freight_in_rs_per_kg;
    let mb_base = if c.use_mb_override {
        c.masterbatch_rs_per_kg
    } else {
        resin_net
    };

    PriceBaseline {
        weight_kg: grams_to_kg(sku.sales.product_weight_grams),
        resin_net_rs_per_kg: resin_net,
        raw_material_rs_per_kg: resin_net * wastage_gross_up,
        masterbatch_rs_per_kg: mb_base * c.masterbatch_ratio * wastage_gross_up,
        packaging_rs_per_kg: c.packaging_rs_per_kg,
        freight_out_rs_per_kg: c.freight_out_rs_per_kg,
        value_add_rs_per_piece: c.value_add_rs_per_piece,
        conversion_rs_per_piece: conversion_recovery_per_piece(sku, capacity),
    }
}

/// Per-year prices. Raw material and masterbatch follow the RM inflation
/// series; every other component follows conversion-cost inflation.
pub fn build_prices(
    sku: &Sku,
    capacity: &Capacity,
    years: usize,
) -> SkuFinanceResult<Vec<PriceYear>> {
    let base = price_baseline(sku, capacity);
    let rm_factors = inflation_factors(&sku.costing.rm_inflation, years)?;
    let conv_factors = inflation_factors(&sku.costing.conversion_inflation, years)?;

    Ok(rm_factors
        .iter()
        .zip(conv_factors.iter())
        .enumerate()
        .map(|(idx, (rm_f, conv_f))| price_for_year(&base, idx as u32 + 1, *rm_f, *conv_f))
        .collect())
}

fn price_for_year(base: &PriceBaseline, year: u32, rm_f: Decimal, conv_f: Decimal) -> PriceYear {
    let w = base.weight_kg;

    let raw_material = base.raw_material_rs_per_kg * rm_f;
    let masterbatch = base.masterbatch_rs_per_kg * rm_f;
    let packaging = base.packaging_rs_per_kg * conv_f;
    let freight_out = base.freight_out_rs_per_kg * conv_f;
    let value_add_pc = base.value_add_rs_per_piece * conv_f;
    let conversion_pc = base.conversion_rs_per_piece * conv_f;

    let per_kg = PriceComponents::from_parts(
        raw_material,
        masterbatch,
        safe_divide_positive(value_add_pc, w),
        packaging,
        freight_out,
        safe_divide_positive(conversion_pc, w),
    );
    let per_piece = PriceComponents::from_parts(
        raw_material * w,
        masterbatch * w,
        value_add_pc,
        packaging * w,
        freight_out * w,
        conversion_pc,
    );

    PriceYear {
        year,
        price_per_piece: per_piece.total,
        per_kg,
        per_piece,
    }
}
