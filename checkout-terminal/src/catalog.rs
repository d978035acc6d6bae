//! Catalog snapshot
//!
//! The barcode catalog is fetched once at startup and held in memory. Until
//! the first fetch succeeds the snapshot is "not loaded", which is different
//! from "loaded, barcode unknown".

use std::sync::Arc;
use std::time::Duration;

use checkout_client::BackendClient;
use parking_lot::RwLock;
use shared::models::Product;
use tokio_util::sync::CancellationToken;

/// Result of resolving a barcode against the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Product),
    Missing,
    NotLoaded,
}

#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    products: RwLock<Option<Arc<Vec<Product>>>>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot (products without a barcode are kept but never match)
    pub fn install(&self, products: Vec<Product>) {
        let count = products.len();
        *self.products.write() = Some(Arc::new(products));
        tracing::info!(products = count, "Catalog installed");
    }

    pub fn is_loaded(&self) -> bool {
        self.products.read().is_some()
    }

    pub fn len(&self) -> usize {
        self.products.read().as_ref().map_or(0, |p| p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, barcode: &str) -> Lookup {
        let guard = self.products.read();
        let Some(products) = guard.as_ref() else {
            return Lookup::NotLoaded;
        };
        products
            .iter()
            .find(|p| p.matches_barcode(barcode))
            .cloned()
            .map_or(Lookup::Missing, Lookup::Found)
    }
}

/// Fetch the catalog, retrying every `retry` until it succeeds
///
/// Returns `None` if cancelled first.
pub async fn fetch_until_ready(
    backend: &dyn BackendClient,
    retry: Duration,
    cancel: &CancellationToken,
) -> Option<Vec<Product>> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = backend.list_products() => result,
        };
        match result {
            Ok(products) => return Some(products),
            Err(e) => {
                tracing::warn!(attempt, error = %e, retry_ms = retry.as_millis() as u64, "Catalog fetch failed");
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}
