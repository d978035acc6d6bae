//! Store backend client
//!
//! The backend owns catalog, PLU, order and invoice persistence. The
//! terminal only consumes it through the request/response contracts below.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::client::{LoginRequest, LoginResponse};
use shared::models::{
    CreatedOrder, OrderRequest, PaymentRequest, PaymentResponse, ProduceItem, Product,
    StoreSettings,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// Backend operations the terminal depends on
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Full barcode catalog (`GET /api/products`)
    async fn list_products(&self) -> ClientResult<Vec<Product>>;

    /// Produce item by PLU code; `None` when the code is unknown
    async fn find_produce(&self, plu_code: &str) -> ClientResult<Option<ProduceItem>>;

    /// Create an order (`POST /api/orders`)
    async fn create_order(
        &self,
        order: &OrderRequest,
        token: Option<&str>,
    ) -> ClientResult<CreatedOrder>;

    /// Ask the wallet service for a payment redirect
    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        token: Option<&str>,
    ) -> ClientResult<PaymentResponse>;

    /// Invoice PDF for an order
    async fn invoice_pdf(&self, order_id: &str, token: Option<&str>) -> ClientResult<Vec<u8>>;

    /// Public store settings (points rate, invoice header)
    async fn settings(&self) -> ClientResult<StoreSettings>;

    /// Exchange credentials for a bearer token
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse>;
}

/// Backend client over HTTP
#[derive(Debug, Clone)]
pub struct NetworkBackendClient {
    client: Client,
    backend_url: String,
    payment_url: String,
}

impl NetworkBackendClient {
    /// Create a new backend client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            backend_url: config.backend_url.clone(),
            payment_url: config.payment_url.clone(),
        })
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.backend_url
    }

    fn with_auth(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(t) => request.bearer_auth(t),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, token: Option<&str>) -> ClientResult<T> {
        let request = Self::with_auth(self.client.get(url), token);
        let response = request.send().await?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let request = Self::with_auth(self.client.post(url).json(body), token);
        let response = request.send().await?;
        handle_response(response).await
    }
}

#[async_trait]
impl BackendClient for NetworkBackendClient {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let url = join_url(&self.backend_url, &["api", "products"])?;
        self.get(url, None).await
    }

    async fn find_produce(&self, plu_code: &str) -> ClientResult<Option<ProduceItem>> {
        let url = join_url(&self.backend_url, &["api", "plus", "plu", plu_code])?;
        match self.get(url, None).await {
            Ok(item) => Ok(Some(item)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_order(
        &self,
        order: &OrderRequest,
        token: Option<&str>,
    ) -> ClientResult<CreatedOrder> {
        let url = join_url(&self.backend_url, &["api", "orders"])?;
        self.post(url, order, token).await
    }

    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        token: Option<&str>,
    ) -> ClientResult<PaymentResponse> {
        let url = join_url(&self.payment_url, &["api", "payment", "payment"])?;
        self.post(url, payment, token).await
    }

    async fn invoice_pdf(&self, order_id: &str, token: Option<&str>) -> ClientResult<Vec<u8>> {
        let url = join_url(&self.backend_url, &["api", "bill", order_id, "invoice"])?;
        let request = Self::with_auth(self.client.get(url), token);
        let response = check_status(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn settings(&self) -> ClientResult<StoreSettings> {
        let url = join_url(&self.backend_url, &["api", "settings"])?;
        self.get(url, None).await
    }

    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let url = join_url(&self.backend_url, &["api", "auth", "login"])?;
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post(url, &request, None).await
    }
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn join_url(base: &str, segments: &[&str]) -> ClientResult<Url> {
    let mut url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a non-2xx response to a [`ClientError`]
pub(crate) async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await?;
    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden(text),
        StatusCode::NOT_FOUND => ClientError::NotFound(text),
        StatusCode::BAD_REQUEST => ClientError::Validation(text),
        _ => ClientError::Status {
            status: status.as_u16(),
            body: text,
        },
    })
}

/// Handle the HTTP response
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> ClientResult<T> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_encodes_segments() {
        let url = join_url("http://localhost:5000", &["api", "plus", "plu", "40 11/x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/plus/plu/40%2011%2Fx");
    }

    #[test]
    fn test_join_url_keeps_base_path() {
        let url = join_url("https://example.ngrok.app/pos", &["api", "orders"]).unwrap();
        assert_eq!(url.as_str(), "https://example.ngrok.app/pos/api/orders");
    }

    #[test]
    fn test_join_url_rejects_garbage() {
        assert!(matches!(
            join_url("not a url", &["api"]),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = NetworkBackendClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
