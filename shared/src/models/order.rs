//! Order Model

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::CartLine;

/// How the customer settles the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Settled in person at the terminal
    #[serde(rename = "CASH")]
    Cash,
    /// Remote e-wallet, settled through a payment redirect
    #[serde(rename = "MOMO")]
    Wallet,
}

impl PaymentMethod {
    /// Status the order is created with
    pub fn initial_status(self) -> OrderStatus {
        match self {
            PaymentMethod::Cash => OrderStatus::Paid,
            PaymentMethod::Wallet => OrderStatus::Pending,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::Wallet => write!(f, "MOMO"),
        }
    }
}

/// Order lifecycle status as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Completed,
    Cancelled,
}

/// One order item in the create-order payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: i64,
    pub is_weighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plu_code: Option<String>,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        // Weight fields travel only with weighed lines.
        let weight = |w: Option<Decimal>| {
            if line.is_weighted {
                w.and_then(|v| v.to_f64())
            } else {
                None
            }
        };
        Self {
            id: line.product_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.unit_price,
            is_weighted: line.is_weighted,
            weight_grams: weight(line.weight_grams),
            weight_kg: weight(line.weight_kg),
            plu_code: if line.is_weighted {
                line.plu_code.clone()
            } else {
                None
            },
        }
    }
}

/// Create order payload (`POST /api/orders`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub cart: Vec<OrderItem>,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub is_guest: bool,
    pub user_id: Option<String>,
}

/// Order as returned by the backend after creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Loyalty points credited by the backend; 0 for guests
    #[serde(default)]
    pub points_earned: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighed_line() -> CartLine {
        CartLine {
            line_id: "w-1".into(),
            product_id: "u1".into(),
            name: "Banana".into(),
            unit_price: 17500,
            quantity: 1,
            is_weighted: true,
            weight_grams: Some(Decimal::new(350, 0)),
            weight_kg: Some(Decimal::new(35, 2)),
            price_per_kg: Some(50000),
            plu_code: Some("4011".into()),
        }
    }

    #[test]
    fn test_order_item_carries_weight_only_when_weighed() {
        let item = OrderItem::from(&weighed_line());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["weightGrams"], 350.0);
        assert_eq!(json["weightKg"], 0.35);
        assert_eq!(json["pluCode"], "4011");

        let mut unit = weighed_line();
        unit.is_weighted = false;
        let json = serde_json::to_value(OrderItem::from(&unit)).unwrap();
        assert!(json.get("weightGrams").is_none());
        assert!(json.get("pluCode").is_none());
    }

    #[test]
    fn test_order_request_wire_names() {
        let request = OrderRequest {
            cart: vec![OrderItem::from(&weighed_line())],
            total_amount: 17500,
            payment_method: PaymentMethod::Cash,
            status: PaymentMethod::Cash.initial_status(),
            is_guest: true,
            user_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["totalAmount"], 17500);
        assert_eq!(json["paymentMethod"], "CASH");
        assert_eq!(json["status"], "paid");
        assert_eq!(json["isGuest"], true);
        assert!(json["userId"].is_null());
    }

    #[test]
    fn test_wallet_orders_start_pending() {
        assert_eq!(PaymentMethod::Wallet.initial_status(), OrderStatus::Pending);
    }

    #[test]
    fn test_created_order_defaults_points() {
        let order: CreatedOrder =
            serde_json::from_str(r#"{"_id":"o1","total":7000,"status":"paid"}"#).unwrap();
        assert_eq!(order.id, "o1");
        assert_eq!(order.points_earned, 0);
        assert_eq!(order.status, Some(OrderStatus::Paid));
    }
}
