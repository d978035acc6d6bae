//! Terminal - composition root
//!
//! Wires the catalog, poller, weight resolver, cart and checkout together and
//! exposes the operations a front end calls. Every failure reaching this layer
//! has already been published as a notice; the returned error is for callers
//! that want to branch on it.

use std::path::PathBuf;
use std::sync::Arc;

use checkout_client::{BackendClient, BridgeClient};
use parking_lot::RwLock;
use shared::client::Identity;
use shared::models::{CartLine, PaymentMethod, Product, StoreSettings};
use tokio::sync::broadcast;

use crate::cart::store::{CartStore, JsonFileCartStore};
use crate::cart::{CartError, CartReconciler};
use crate::catalog::{self, CatalogSnapshot};
use crate::checkout::{CheckoutOptions, CheckoutOutcome, CheckoutState, CheckoutSubmitter};
use crate::core::{BackgroundTasks, Config, Result, TaskKind, TerminalError};
use crate::notice::{Notice, NoticeBus};
use crate::poller::{DevicePoller, PollOutcome, PollerHandle, ScanIntake};
use crate::session::Session;
use crate::weigh::{WeighedItem, WeightResolver};

/// Builder for [`Terminal`]; collaborators default to the network clients and
/// the on-disk cart snapshot described by the config
pub struct TerminalBuilder {
    config: Config,
    backend: Option<Arc<dyn BackendClient>>,
    bridge: Option<Arc<dyn BridgeClient>>,
    cart_store: Option<Arc<dyn CartStore>>,
}

impl TerminalBuilder {
    pub fn backend(mut self, backend: Arc<dyn BackendClient>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn bridge(mut self, bridge: Arc<dyn BridgeClient>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn cart_store(mut self, store: Arc<dyn CartStore>) -> Self {
        self.cart_store = Some(store);
        self
    }

    pub fn build(self) -> Result<Terminal> {
        let config = self.config;
        config.validate()?;

        let client_config = config.client_config();
        let backend: Arc<dyn BackendClient> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(client_config.build_backend_client()?),
        };
        let bridge: Arc<dyn BridgeClient> = match self.bridge {
            Some(bridge) => bridge,
            None => Arc::new(client_config.build_bridge_client()?),
        };
        let store: Arc<dyn CartStore> = match self.cart_store {
            Some(store) => store,
            None => Arc::new(JsonFileCartStore::new(config.cart_snapshot_path())),
        };

        let notices = NoticeBus::new();
        let session = Arc::new(Session::new());
        let catalog = Arc::new(CatalogSnapshot::new());
        let cart = Arc::new(CartReconciler::restore(store));
        let intake = Arc::new(ScanIntake::new(catalog.clone(), cart.clone(), notices.clone()));
        let poller_handle = PollerHandle::new();
        let poller = Arc::new(DevicePoller::new(
            bridge.clone(),
            intake.clone(),
            poller_handle.clone(),
            config.poll_interval,
        ));
        let weigher = Arc::new(WeightResolver::new(
            backend.clone(),
            bridge,
            cart.clone(),
            notices.clone(),
        ));
        let checkout = CheckoutSubmitter::new(
            backend.clone(),
            cart.clone(),
            intake.clone(),
            session.clone(),
            poller_handle.clone(),
            notices.clone(),
            CheckoutOptions {
                redirect_url: client_config.payment_return_url(),
                ipn_url: client_config.payment_ipn_url(),
                cursor_reset_delay: config.cursor_reset_delay,
            },
        );

        // Logout order: empty the cart, drop deferred scans, stop weighing,
        // then end polling
        session.add_listener(cart.clone());
        session.add_listener(intake.clone());
        session.add_listener(weigher.clone());
        session.add_listener(Arc::new(poller_handle.clone()));

        Ok(Terminal {
            config,
            backend,
            notices,
            session,
            catalog,
            cart,
            intake,
            poller,
            poller_handle,
            weigher,
            checkout,
            settings: Arc::new(RwLock::new(StoreSettings::default())),
        })
    }
}

pub struct Terminal {
    config: Config,
    backend: Arc<dyn BackendClient>,
    notices: NoticeBus,
    session: Arc<Session>,
    catalog: Arc<CatalogSnapshot>,
    cart: Arc<CartReconciler>,
    intake: Arc<ScanIntake>,
    poller: Arc<DevicePoller>,
    poller_handle: PollerHandle,
    weigher: Arc<WeightResolver>,
    checkout: CheckoutSubmitter,
    settings: Arc<RwLock<StoreSettings>>,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("backend_url", &self.config.backend_url)
            .field("bridge_url", &self.config.bridge_url)
            .field("session", &self.session)
            .field("catalog_loaded", &self.catalog.is_loaded())
            .finish_non_exhaustive()
    }
}

impl Terminal {
    pub fn builder(config: Config) -> TerminalBuilder {
        TerminalBuilder {
            config,
            backend: None,
            bridge: None,
            cart_store: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the catalog warmup and the device poller
    pub fn start(&self, tasks: &mut BackgroundTasks) {
        let shutdown = tasks.shutdown_token();

        let backend = self.backend.clone();
        let intake = self.intake.clone();
        let settings = self.settings.clone();
        let retry = self.config.catalog_retry;
        let cancel = shutdown.clone();
        tasks.spawn("catalog_loader", TaskKind::Warmup, async move {
            let loaded = tokio::select! {
                _ = cancel.cancelled() => return,
                loaded = backend.settings() => loaded,
            };
            match loaded {
                Ok(loaded) => *settings.write() = loaded,
                Err(e) => tracing::warn!(error = %e, "Store settings unavailable, using defaults"),
            }
            if let Some(products) = catalog::fetch_until_ready(backend.as_ref(), retry, &cancel).await {
                intake.install_catalog(products);
            }
        });

        let poller = self.poller.clone();
        tasks.spawn("device_poller", TaskKind::Periodic, async move {
            poller.run(shutdown).await;
        });
    }

    // ========== Notices ==========

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    // ========== Catalog and scanning ==========

    /// Install a catalog directly (replays deferred scans)
    pub fn install_catalog(&self, products: Vec<Product>) -> usize {
        self.intake.install_catalog(products)
    }

    pub fn catalog_loaded(&self) -> bool {
        self.catalog.is_loaded()
    }

    /// Run a single poll outside the background loop
    pub async fn poll_once(&self) -> PollOutcome {
        self.poller.poll_once().await
    }

    pub fn last_observed_barcode(&self) -> Option<String> {
        self.poller_handle.last_observed_barcode()
    }

    // ========== Cart ==========

    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.cart.lines()
    }

    pub fn total_amount(&self) -> i64 {
        self.cart.total_amount()
    }

    pub fn total_quantity(&self) -> u64 {
        self.cart.total_quantity()
    }

    /// Points the customer would earn at the store's current rate; the
    /// backend has the final say
    pub fn provisional_points(&self) -> i64 {
        self.settings.read().estimate_points(self.cart.total_amount())
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings.read().clone()
    }

    pub fn adjust_line(&self, line_id: &str, delta: i32) -> Result<Option<CartLine>> {
        self.cart
            .adjust_quantity(line_id, delta)
            .map_err(|e| self.cart_failed(e))
    }

    pub fn remove_line(&self, line_id: &str) -> Result<CartLine> {
        self.cart.remove(line_id).map_err(|e| self.cart_failed(e))
    }

    fn cart_failed(&self, e: CartError) -> TerminalError {
        self.notices.warning(e.to_string());
        e.into()
    }

    // ========== Weighing ==========

    pub fn select_plu(&self, code: &str) {
        self.weigher.select_code(code);
    }

    pub fn leave_plu(&self) {
        self.weigher.leave();
    }

    pub async fn weigh(&self) -> Result<WeighedItem> {
        Ok(self.weigher.weigh().await?)
    }

    pub fn commit_weighed(&self) -> Result<CartLine> {
        Ok(self.weigher.commit()?)
    }

    pub async fn add_by_plu(&self, code: &str) -> Result<CartLine> {
        Ok(self.weigher.add_by_plu(code).await?)
    }

    // ========== Checkout ==========

    pub async fn submit_checkout(&self, method: PaymentMethod) -> Result<CheckoutOutcome> {
        Ok(self.checkout.submit(method).await?)
    }

    pub fn checkout_state(&self) -> CheckoutState {
        self.checkout.state()
    }

    /// Fetch the invoice PDF and save it as `invoice_<order id>.pdf`
    pub async fn download_invoice(&self, order_id: &str) -> Result<PathBuf> {
        match self.fetch_invoice(order_id).await {
            Ok(path) => {
                self.notices.success(format!("Invoice saved to {}", path.display()));
                Ok(path)
            }
            Err(e) => {
                tracing::error!(order_id, error = %e, "Invoice download failed");
                self.notices.error("Could not download invoice");
                Err(e)
            }
        }
    }

    async fn fetch_invoice(&self, order_id: &str) -> Result<PathBuf> {
        let token = self.session.token();
        let bytes = self.backend.invoice_pdf(order_id, token.as_deref()).await?;

        let dir = self.config.invoice_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(invoice_file_name(order_id));
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(order_id, bytes = bytes.len(), path = %path.display(), "Invoice saved");
        Ok(path)
    }

    // ========== Session ==========

    pub fn identity(&self) -> Identity {
        self.session.identity()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        match self.backend.login(username, password).await {
            Ok(login) => {
                self.session.sign_in(login);
                let identity = self.session.identity();
                self.notices
                    .success(format!("Welcome, {}", identity.display_name()));
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(username, error = %e, "Login failed");
                self.notices.error(format!("Login failed: {e}"));
                Err(TerminalError::Client(e))
            }
        }
    }

    /// Clear the cart, stop weighing, end the polling session, continue as guest
    pub fn logout(&self) {
        self.session.logout();
        self.notices.info("Logged out");
    }
}

fn invoice_file_name(order_id: &str) -> String {
    let safe: String = order_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("invoice_{safe}.pdf")
}
