//! Product Model

use serde::{Deserialize, Serialize};

/// Barcode-indexed product sold at a unit price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    /// Price in integer currency units
    pub price: i64,
    #[serde(default)]
    pub category: String,
}

impl Product {
    /// Whether this product is acquired by scanning `barcode`.
    ///
    /// Both sides are trimmed; scanners and admin forms disagree on padding.
    pub fn matches_barcode(&self, barcode: &str) -> bool {
        self.barcode
            .as_deref()
            .map(str::trim)
            .is_some_and(|own| !own.is_empty() && own == barcode.trim())
    }
}

/// Bulk produce item priced by weight, identified by a PLU code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub plu_code: String,
    pub name: String,
    /// Price per kilogram in integer currency units
    pub price_per_kg: i64,
    #[serde(default)]
    pub category: String,
}
