//! Wallet payment DTOs

use serde::{Deserialize, Serialize};

/// Create payment request sent to the wallet payment service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: String,
    pub order_info: String,
    /// Where the wallet sends the customer back after paying
    pub redirect_url: String,
    /// Server-to-server settlement notification endpoint
    pub ipn_url: String,
    /// Amount as decimal text, as the wallet API expects
    pub amount: String,
}

/// Payment service response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub data: Option<PaymentData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[serde(default)]
    pub pay_url: Option<String>,
}

impl PaymentResponse {
    /// The redirect URL, if the response carries a non-empty one
    pub fn pay_url(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.pay_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_url_extraction() {
        let ok: PaymentResponse =
            serde_json::from_str(r#"{"data":{"payUrl":"https://pay.example/abc"}}"#).unwrap();
        assert_eq!(ok.pay_url(), Some("https://pay.example/abc"));

        let missing: PaymentResponse = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert_eq!(missing.pay_url(), None);

        let empty: PaymentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(empty.pay_url(), None);
    }
}
