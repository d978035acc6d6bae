//! Device bridge client
//!
//! The bridge is a small HTTP service next to the scanner and the scale.
//! `last-barcode` is polled; `start-weigh` is called when the operator asks.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use shared::models::{ScanEvent, WeighReading, WeighRequest};
use std::time::Duration;

use crate::http::{handle_response, join_url};
use crate::{ClientConfig, ClientResult};

/// Bridge operations the terminal depends on
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Most recent scan the bridge has seen (not a queue)
    async fn last_scan(&self) -> ClientResult<ScanEvent>;

    /// Weigh whatever is on the scale for `plu_code`
    async fn start_weigh(&self, plu_code: &str) -> ClientResult<WeighReading>;
}

/// Bridge client over HTTP
#[derive(Debug, Clone)]
pub struct NetworkBridgeClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
    weigh_timeout: Duration,
}

impl NetworkBridgeClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.bridge_url.clone(),
            poll_timeout: config.poll_timeout,
            weigh_timeout: config.weigh_timeout,
        })
    }

    /// Bridge base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BridgeClient for NetworkBridgeClient {
    async fn last_scan(&self) -> ClientResult<ScanEvent> {
        let url = join_url(&self.base_url, &["last-barcode"])?;
        let response = self
            .client
            .get(url)
            .timeout(self.poll_timeout)
            .header(ACCEPT, "application/json")
            // Bridges exposed through ngrok answer with an HTML interstitial otherwise
            .header("ngrok-skip-browser-warning", "true")
            .send()
            .await?;
        handle_response(response).await
    }

    async fn start_weigh(&self, plu_code: &str) -> ClientResult<WeighReading> {
        let url = join_url(&self.base_url, &["start-weigh"])?;
        let body = WeighRequest {
            plu: plu_code.to_string(),
        };
        let response = self
            .client
            .post(url)
            .timeout(self.weigh_timeout)
            .header("ngrok-skip-browser-warning", "true")
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }
}
