//! Client configuration

use std::time::Duration;

/// Endpoints and timeouts for the terminal's remote collaborators
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Store backend base URL (catalog, PLU lookup, orders, invoices)
    pub backend_url: String,

    /// Device bridge base URL (scanner and scale)
    pub bridge_url: String,

    /// Wallet payment service base URL
    pub payment_url: String,

    /// Timeout for backend and payment requests
    pub request_timeout: Duration,

    /// Timeout for a single last-barcode poll; a timeout counts as "no event"
    pub poll_timeout: Duration,

    /// Timeout for a weigh request; the operator is waiting on the scale
    pub weigh_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default timeouts
    pub fn new(
        backend_url: impl Into<String>,
        bridge_url: impl Into<String>,
        payment_url: impl Into<String>,
    ) -> Self {
        Self {
            backend_url: trim_base(backend_url.into()),
            bridge_url: trim_base(bridge_url.into()),
            payment_url: trim_base(payment_url.into()),
            request_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(5),
            weigh_timeout: Duration::from_secs(15),
        }
    }

    /// Set the backend/payment request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the poll timeout
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the weigh timeout
    pub fn with_weigh_timeout(mut self, timeout: Duration) -> Self {
        self.weigh_timeout = timeout;
        self
    }

    /// Where the wallet returns the customer after paying
    pub fn payment_return_url(&self) -> String {
        format!("{}/momo_return", self.payment_url)
    }

    /// Wallet settlement notification endpoint
    pub fn payment_ipn_url(&self) -> String {
        format!("{}/momo_ipn", self.payment_url)
    }

    /// Create a backend client from this configuration
    pub fn build_backend_client(&self) -> crate::ClientResult<super::NetworkBackendClient> {
        super::NetworkBackendClient::new(self)
    }

    /// Create a bridge client from this configuration
    pub fn build_bridge_client(&self) -> crate::ClientResult<super::NetworkBridgeClient> {
        super::NetworkBridgeClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            "http://localhost:5000",
            "http://localhost:5001",
            "http://localhost:5002",
        )
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
