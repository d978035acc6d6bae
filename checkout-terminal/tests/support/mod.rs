// Hand-written collaborators that record every call, so tests can assert
// exactly which requests the terminal made.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use checkout_client::{BackendClient, BridgeClient, ClientError, ClientResult};
use checkout_terminal::cart::store::{CartStore, MemoryCartStore};
use checkout_terminal::{Config, Terminal};
use parking_lot::Mutex;
use shared::client::{LoginResponse, UserInfo};
use shared::models::{
    CreatedOrder, OrderRequest, PaymentData, PaymentRequest, PaymentResponse, ProduceItem,
    Product, ScanEvent, ScanTimestamp, StoreSettings, WeighReading,
};

pub fn product(id: &str, barcode: &str, price: i64) -> Product {
    Product {
        id: id.into(),
        barcode: Some(barcode.into()),
        name: id.into(),
        price,
        category: "grocery".into(),
    }
}

pub fn produce(id: &str, plu: &str, price_per_kg: i64) -> ProduceItem {
    ProduceItem {
        id: id.into(),
        plu_code: plu.into(),
        name: id.into(),
        price_per_kg,
        category: "produce".into(),
    }
}

// ========== Bridge ==========

#[derive(Default)]
pub struct FakeBridge {
    scan: Mutex<ScanEvent>,
    fail_polls: AtomicBool,
    weight: Mutex<serde_json::Value>,
    weigh_delay: Mutex<Duration>,
    pub poll_calls: AtomicUsize,
    pub weigh_calls: AtomicUsize,
}

impl FakeBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// What `GET /last-barcode` reports from now on
    pub fn set_scan(&self, barcode: &str, ts: &str) {
        *self.scan.lock() = ScanEvent {
            barcode: barcode.into(),
            timestamp: Some(ScanTimestamp::new(ts)),
            sym: Some("EAN13".into()),
        };
    }

    pub fn clear_scan(&self) {
        *self.scan.lock() = ScanEvent::default();
    }

    pub fn fail_polls(&self, fail: bool) {
        self.fail_polls.store(fail, Ordering::SeqCst);
    }

    pub fn set_weight(&self, weight: serde_json::Value) {
        *self.weight.lock() = weight;
    }

    pub fn set_weigh_delay(&self, delay: Duration) {
        *self.weigh_delay.lock() = delay;
    }

    pub fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn weighs(&self) -> usize {
        self.weigh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BridgeClient for FakeBridge {
    async fn last_scan(&self) -> ClientResult<ScanEvent> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 502,
                body: "bridge down".into(),
            });
        }
        Ok(self.scan.lock().clone())
    }

    async fn start_weigh(&self, _plu_code: &str) -> ClientResult<WeighReading> {
        self.weigh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.weigh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(WeighReading {
            weight: self.weight.lock().clone(),
        })
    }
}

// ========== Backend ==========

pub struct FakeBackend {
    products: Mutex<Vec<Product>>,
    produce: Mutex<Vec<ProduceItem>>,
    catalog_failures: AtomicUsize,
    fail_orders: AtomicBool,
    order_delay: Mutex<Duration>,
    pay_url: Mutex<Option<String>>,
    pub orders: Mutex<Vec<(OrderRequest, Option<String>)>>,
    pub payments: Mutex<Vec<PaymentRequest>>,
    pub list_calls: AtomicUsize,
    pub produce_calls: AtomicUsize,
    pub invoice_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(Vec::new()),
            produce: Mutex::new(Vec::new()),
            catalog_failures: AtomicUsize::new(0),
            fail_orders: AtomicBool::new(false),
            order_delay: Mutex::new(Duration::ZERO),
            pay_url: Mutex::new(Some("https://wallet.example/pay/abc".into())),
            orders: Mutex::new(Vec::new()),
            payments: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            produce_calls: AtomicUsize::new(0),
            invoice_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_products(self: Arc<Self>, products: Vec<Product>) -> Arc<Self> {
        *self.products.lock() = products;
        self
    }

    pub fn with_produce(self: Arc<Self>, produce: Vec<ProduceItem>) -> Arc<Self> {
        *self.produce.lock() = produce;
        self
    }

    /// Fail the next `n` catalog fetches
    pub fn fail_catalog(&self, n: usize) {
        self.catalog_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    /// Hold every `create_order` call for `delay`
    pub fn set_order_delay(&self, delay: Duration) {
        *self.order_delay.lock() = delay;
    }

    pub fn set_pay_url(&self, url: Option<&str>) {
        *self.pay_url.lock() = url.map(Into::into);
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn last_order(&self) -> Option<(OrderRequest, Option<String>)> {
        self.orders.lock().last().cloned()
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.catalog_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.catalog_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::Status {
                status: 503,
                body: "starting".into(),
            });
        }
        Ok(self.products.lock().clone())
    }

    async fn find_produce(&self, plu_code: &str) -> ClientResult<Option<ProduceItem>> {
        self.produce_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .produce
            .lock()
            .iter()
            .find(|p| p.plu_code == plu_code)
            .cloned())
    }

    async fn create_order(
        &self,
        order: &OrderRequest,
        token: Option<&str>,
    ) -> ClientResult<CreatedOrder> {
        let delay = *self.order_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "database unavailable".into(),
            });
        }
        let mut orders = self.orders.lock();
        orders.push((order.clone(), token.map(Into::into)));
        Ok(CreatedOrder {
            id: format!("order-{}", orders.len()),
            total: Some(order.total_amount),
            status: Some(order.status),
            points_earned: if order.is_guest { 0 } else { order.total_amount / 10_000 },
        })
    }

    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        _token: Option<&str>,
    ) -> ClientResult<PaymentResponse> {
        self.payments.lock().push(payment.clone());
        Ok(PaymentResponse {
            data: Some(PaymentData {
                pay_url: self.pay_url.lock().clone(),
            }),
        })
    }

    async fn invoice_pdf(&self, order_id: &str, _token: Option<&str>) -> ClientResult<Vec<u8>> {
        self.invoice_calls.fetch_add(1, Ordering::SeqCst);
        if order_id == "missing" {
            return Err(ClientError::NotFound("order".into()));
        }
        Ok(b"%PDF-1.4 invoice".to_vec())
    }

    async fn settings(&self) -> ClientResult<StoreSettings> {
        Ok(StoreSettings {
            points_rate: 1000,
            ..StoreSettings::default()
        })
    }

    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        if password != "secret" {
            return Err(ClientError::Unauthorized);
        }
        Ok(LoginResponse {
            token: format!("token-{username}"),
            user: UserInfo {
                id: format!("user-{username}"),
                username: username.into(),
                full_name: String::new(),
                is_admin: false,
                points: 0,
            },
        })
    }
}

// ========== Terminal ==========

pub fn test_config(work_dir: &std::path::Path) -> Config {
    Config {
        work_dir: work_dir.to_path_buf(),
        backend_url: "http://backend.test".into(),
        bridge_url: "http://bridge.test".into(),
        payment_url: "http://pay.test".into(),
        poll_interval: Duration::from_millis(1000),
        poll_timeout: Duration::from_secs(5),
        weigh_timeout: Duration::from_secs(15),
        request_timeout: Duration::from_secs(30),
        cursor_reset_delay: Duration::from_millis(100),
        catalog_retry: Duration::from_millis(5000),
        log_level: "debug".into(),
        log_dir: None,
    }
}

pub struct Harness {
    pub terminal: Terminal,
    pub backend: Arc<FakeBackend>,
    pub bridge: Arc<FakeBridge>,
    pub store: Arc<MemoryCartStore>,
    pub work_dir: tempfile::TempDir,
}

pub fn harness(backend: Arc<FakeBackend>) -> Harness {
    harness_with_store(backend, Arc::new(MemoryCartStore::new()))
}

pub fn harness_with_store(backend: Arc<FakeBackend>, store: Arc<MemoryCartStore>) -> Harness {
    let work_dir = tempfile::tempdir().unwrap();
    let bridge = FakeBridge::new();
    let terminal = Terminal::builder(test_config(work_dir.path()))
        .backend(backend.clone())
        .bridge(bridge.clone())
        .cart_store(store.clone() as Arc<dyn CartStore>)
        .build()
        .unwrap();
    Harness {
        terminal,
        backend,
        bridge,
        store,
        work_dir,
    }
}
