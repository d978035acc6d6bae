//! Store settings (public view)

use serde::{Deserialize, Serialize};

/// Default spend per loyalty point, in currency units
pub const DEFAULT_POINTS_RATE: i64 = 10_000;

/// Public store settings returned by `GET /api/settings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// Spend required for one loyalty point
    #[serde(default = "default_points_rate")]
    pub points_rate: i64,
    /// Redemption value of one point
    #[serde(default)]
    pub point_value: i64,
    #[serde(default)]
    pub invoice_title: String,
    #[serde(default)]
    pub invoice_note: String,
}

fn default_points_rate() -> i64 {
    DEFAULT_POINTS_RATE
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: String::new(),
            address: String::new(),
            phone: String::new(),
            points_rate: DEFAULT_POINTS_RATE,
            point_value: 1000,
            invoice_title: String::new(),
            invoice_note: String::new(),
        }
    }
}

impl StoreSettings {
    /// Provisional points for a spend. The backend value is authoritative.
    pub fn estimate_points(&self, total_amount: i64) -> i64 {
        if self.points_rate <= 0 || total_amount <= 0 {
            return 0;
        }
        total_amount / self.points_rate
    }
}
