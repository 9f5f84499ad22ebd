use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coupon::Coupon;
use crate::listing::InventoryUnit;
use crate::CatalogError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a whole percentage, 0..=100.
    Percentage,
    /// `value` is minor units off each priced unit (ticket, or room-night).
    Fixed,
}

/// Vendor-defined discount on a ticket or room type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: i64,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.map_or(true, |end| now < end)
    }

    /// Amount taken off `gross` for `units` priced units. Never exceeds `gross`.
    /// `None` when the arithmetic overflows.
    pub fn amount_off(&self, gross: i64, units: i64, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_active(now) || gross <= 0 {
            return Some(0);
        }
        let off = match self.kind {
            DiscountKind::Percentage => gross.checked_mul(self.value.clamp(0, 100))? / 100,
            DiscountKind::Fixed => self.value.max(0).checked_mul(units)?,
        };
        Some(off.min(gross))
    }
}

/// One priced line of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineQuote {
    pub unit_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub nights: i32,
    pub gross: i64,
    pub discount: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Totals {
    /// Sum of line nets.
    pub subtotal: i64,
    /// Sum of line discounts.
    pub discount_total: i64,
    pub coupon_discount: i64,
    pub total: i64,
}

pub struct PricingEngine;

impl PricingEngine {
    /// `unit_price * quantity * nights`, less the unit's discount, floored at zero.
    pub fn quote_line<U: InventoryUnit + ?Sized>(
        unit: &U,
        quantity: i32,
        nights: i32,
        now: DateTime<Utc>,
    ) -> Result<LineQuote, CatalogError> {
        let overflow = || CatalogError::AmountOverflow(unit.name().to_string());
        let units = i64::from(quantity) * i64::from(nights);
        let gross = unit.unit_price().checked_mul(units).ok_or_else(overflow)?;
        let discount = match unit.discount() {
            Some(d) => d.amount_off(gross, units, now).ok_or_else(overflow)?,
            None => 0,
        };

        Ok(LineQuote {
            unit_id: unit.id(),
            name: unit.name().to_string(),
            unit_price: unit.unit_price(),
            quantity,
            nights,
            gross,
            discount,
            net: (gross - discount).max(0),
        })
    }

    pub fn summarize(lines: &[LineQuote], coupon: Option<&Coupon>) -> Result<Totals, CatalogError> {
        let overflow = || CatalogError::AmountOverflow("booking total".to_string());
        let subtotal = lines
            .iter()
            .try_fold(0i64, |acc, l| acc.checked_add(l.net))
            .ok_or_else(overflow)?;
        let discount_total = lines
            .iter()
            .try_fold(0i64, |acc, l| acc.checked_add(l.discount))
            .ok_or_else(overflow)?;
        let coupon_discount = match coupon {
            Some(c) => c.amount_off(subtotal).ok_or_else(overflow)?,
            None => 0,
        };

        Ok(Totals {
            subtotal,
            discount_total,
            coupon_discount,
            total: (subtotal - coupon_discount).max(0),
        })
    }
}
