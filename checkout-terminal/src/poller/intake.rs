//! Scan intake
//!
//! Resolves fresh barcodes against the catalog and feeds the cart. Scans that
//! arrive before the catalog is loaded are held in a bounded queue and
//! replayed, in arrival order, once it is installed.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use shared::models::{CartLine, Product};

use crate::cart::CartReconciler;
use crate::catalog::{CatalogSnapshot, Lookup};
use crate::notice::NoticeBus;
use crate::session::SessionListener;

/// Scans held while the catalog is still loading
pub const PENDING_SCAN_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Added(CartLine),
    Unknown,
    Deferred,
}

#[derive(Debug)]
pub struct ScanIntake {
    catalog: Arc<CatalogSnapshot>,
    cart: Arc<CartReconciler>,
    notices: NoticeBus,
    pending: Mutex<VecDeque<String>>,
}

impl ScanIntake {
    pub fn new(catalog: Arc<CatalogSnapshot>, cart: Arc<CartReconciler>, notices: NoticeBus) -> Self {
        Self {
            catalog,
            cart,
            notices,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogSnapshot> {
        &self.catalog
    }

    /// Resolve one fresh barcode
    pub fn accept(&self, barcode: &str) -> IntakeOutcome {
        // Pending lock first so a concurrent install cannot reorder scans
        let mut pending = self.pending.lock();
        match self.catalog.lookup(barcode) {
            Lookup::Found(product) => self.add(&product),
            Lookup::Missing => self.unknown(barcode),
            Lookup::NotLoaded => {
                if pending.len() >= PENDING_SCAN_CAPACITY
                    && let Some(dropped) = pending.pop_front()
                {
                    tracing::warn!(barcode = %dropped, "Pending scan queue full, dropping oldest");
                }
                pending.push_back(barcode.to_string());
                tracing::info!(barcode, queued = pending.len(), "Catalog not loaded, scan deferred");
                self.notices
                    .info(format!("Catalog still loading, {barcode} will be added shortly"));
                IntakeOutcome::Deferred
            }
        }
    }

    /// Install the catalog and replay deferred scans; returns how many were replayed
    pub fn install_catalog(&self, products: Vec<Product>) -> usize {
        let mut pending = self.pending.lock();
        self.catalog.install(products);
        let replay: Vec<String> = pending.drain(..).collect();
        for barcode in &replay {
            match self.catalog.lookup(barcode) {
                Lookup::Found(product) => {
                    self.add(&product);
                }
                _ => {
                    self.unknown(barcode);
                }
            }
        }
        if !replay.is_empty() {
            tracing::info!(count = replay.len(), "Replayed deferred scans");
        }
        replay.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Forget deferred scans; they belong to a sale that has ended
    pub fn discard_pending(&self) -> usize {
        let mut pending = self.pending.lock();
        let dropped = pending.len();
        if dropped > 0 {
            let barcodes: Vec<String> = pending.drain(..).collect();
            tracing::warn!(count = dropped, barcodes = ?barcodes, "Discarded deferred scans");
            self.notices.warning(format!(
                "{dropped} scan(s) made while the catalog was loading were not added: {}",
                barcodes.join(", ")
            ));
        }
        dropped
    }

    fn add(&self, product: &Product) -> IntakeOutcome {
        let line = self.cart.add_or_increment(product);
        tracing::info!(product_id = %product.id, quantity = line.quantity, "Scanned product added");
        self.notices.success(format!("Added {}", product.name));
        IntakeOutcome::Added(line)
    }

    fn unknown(&self, barcode: &str) -> IntakeOutcome {
        tracing::warn!(barcode, "Scanned barcode not in catalog");
        self.notices
            .warning(format!("Unknown product for barcode {barcode}"));
        IntakeOutcome::Unknown
    }
}

impl SessionListener for ScanIntake {
    fn on_logout(&self) {
        self.discard_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::store::MemoryCartStore;
    use crate::notice::Severity;

    fn product(id: &str, barcode: &str, price: i64) -> Product {
        Product {
            id: id.into(),
            barcode: Some(barcode.into()),
            name: id.into(),
            price,
            category: "grocery".into(),
        }
    }

    fn intake() -> (ScanIntake, Arc<CartReconciler>, NoticeBus) {
        let cart = Arc::new(CartReconciler::restore(Arc::new(MemoryCartStore::new())));
        let notices = NoticeBus::new();
        let intake = ScanIntake::new(Arc::new(CatalogSnapshot::new()), cart.clone(), notices.clone());
        (intake, cart, notices)
    }

    #[test]
    fn test_known_and_unknown() {
        let (intake, cart, notices) = intake();
        let mut rx = notices.subscribe();
        intake.install_catalog(vec![product("milk", "111", 1000)]);

        assert!(matches!(intake.accept("111"), IntakeOutcome::Added(l) if l.quantity == 1));
        assert_eq!(rx.try_recv().unwrap().severity, Severity::Success);

        assert_eq!(intake.accept("999"), IntakeOutcome::Unknown);
        assert_eq!(rx.try_recv().unwrap().severity, Severity::Warning);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_deferred_scans_replay_in_order() {
        let (intake, cart, _) = intake();

        assert_eq!(intake.accept("222"), IntakeOutcome::Deferred);
        assert_eq!(intake.accept("111"), IntakeOutcome::Deferred);
        assert_eq!(intake.accept("404"), IntakeOutcome::Deferred);
        assert!(cart.is_empty());

        let replayed = intake.install_catalog(vec![
            product("milk", "111", 1000),
            product("bread", "222", 2000),
        ]);

        assert_eq!(replayed, 3);
        assert_eq!(intake.pending_len(), 0);
        let ids: Vec<_> = cart.lines().into_iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec!["bread", "milk"]);
    }

    #[test]
    fn test_pending_queue_is_bounded() {
        let (intake, cart, _) = intake();
        for i in 0..PENDING_SCAN_CAPACITY + 5 {
            intake.accept(&format!("bc{i}"));
        }
        assert_eq!(intake.pending_len(), PENDING_SCAN_CAPACITY);

        // oldest five were dropped
        intake.install_catalog(vec![product("first", "bc0", 1), product("sixth", "bc5", 1)]);
        let ids: Vec<_> = cart.lines().into_iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec!["sixth"]);
    }

    #[test]
    fn test_logout_drops_deferred_scans() {
        let (intake, cart, notices) = intake();
        assert_eq!(intake.accept("111"), IntakeOutcome::Deferred);
        assert_eq!(intake.pending_len(), 1);

        let mut rx = notices.subscribe();
        intake.on_logout();
        assert_eq!(intake.pending_len(), 0);
        assert_eq!(rx.try_recv().unwrap().severity, Severity::Warning);

        assert_eq!(intake.install_catalog(vec![product("milk", "111", 1000)]), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_discard_with_nothing_pending_is_silent() {
        let (intake, _, notices) = intake();
        let mut rx = notices.subscribe();
        assert_eq!(intake.discard_pending(), 0);
        assert!(rx.try_recv().is_err());
    }
}
