//! Cart line model
//!
//! A cart line is also the unit of the durable cart snapshot, so the serde
//! form is the on-disk format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;

/// One line of the checkout cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart key. Equal to `product_id` for unit-priced items, unique per
    /// weighing for weighed items.
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    /// Resolved price in integer currency units (weight already applied)
    pub unit_price: i64,
    /// Always >= 1, always 1 for weighed lines
    pub quantity: u32,
    #[serde(default)]
    pub is_weighted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plu_code: Option<String>,
}

impl CartLine {
    /// New unit-priced line with quantity 1
    pub fn unit(product: &Product) -> Self {
        Self {
            line_id: product.id.clone(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            is_weighted: false,
            weight_grams: None,
            weight_kg: None,
            price_per_kg: None,
            plu_code: None,
        }
    }

    /// `unit_price × quantity`, `None` on overflow
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}
