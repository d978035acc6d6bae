//! Cart reconciliation
//!
//! The cart is shared by the device poller, the weight resolver and operator
//! actions. Every operation takes the lock, mutates, writes the snapshot and
//! releases the lock without awaiting anything in between, so concurrent
//! callers never interleave a read-modify-write.

pub mod store;

use std::sync::Arc;

use parking_lot::Mutex;
use shared::models::{CartLine, Product};
use thiserror::Error;

use crate::session::SessionListener;
use store::CartStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    #[error("Quantity of weighed line {0} is fixed at 1")]
    WeighedLineFixed(String),

    #[error("Cart line already exists: {0}")]
    DuplicateLine(String),

    #[error("Not a weighed line: {0}")]
    NotWeighed(String),
}

/// Ordered cart lines, keyed by `line_id`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    /// Σ unit_price × quantity, saturating at `i64::MAX`
    pub fn total_amount(&self) -> i64 {
        self.lines.iter().fold(0i64, |acc, line| {
            acc.saturating_add(line.line_total().unwrap_or(i64::MAX))
        })
    }

    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Serialized owner of the cart and its durable snapshot
pub struct CartReconciler {
    cart: Mutex<Cart>,
    store: Arc<dyn CartStore>,
}

impl std::fmt::Debug for CartReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartReconciler")
            .field("cart", &*self.cart.lock())
            .finish_non_exhaustive()
    }
}

impl CartReconciler {
    /// Start from whatever the store last saved
    ///
    /// An unreadable snapshot is logged and the terminal starts with an empty
    /// cart.
    pub fn restore(store: Arc<dyn CartStore>) -> Self {
        let lines = match store.load() {
            Ok(lines) => lines.into_iter().filter(|l| l.quantity >= 1).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart snapshot unreadable, starting empty");
                Vec::new()
            }
        };
        if !lines.is_empty() {
            tracing::info!(lines = lines.len(), "Cart restored from snapshot");
        }
        Self {
            cart: Mutex::new(Cart::from_lines(lines)),
            store,
        }
    }

    fn persist(&self, cart: &Cart) {
        if let Err(e) = self.store.save(cart.lines()) {
            tracing::warn!(error = %e, "Failed to write cart snapshot");
        }
    }

    /// Increment the product's line, or append a new line with quantity 1
    pub fn add_or_increment(&self, product: &Product) -> CartLine {
        let mut cart = self.cart.lock();
        let existing = cart
            .lines
            .iter()
            .position(|l| l.line_id == product.id && !l.is_weighted);
        let line = match existing {
            Some(index) => {
                let existing = &mut cart.lines[index];
                existing.quantity = existing.quantity.saturating_add(1);
                existing.clone()
            }
            None => {
                let line = CartLine::unit(product);
                cart.lines.push(line.clone());
                line
            }
        };
        self.persist(&cart);
        tracing::debug!(product_id = %product.id, quantity = line.quantity, "Cart line added");
        line
    }

    /// Append a weighed line; each weighing is its own line
    pub fn add_weighed(&self, line: CartLine) -> Result<CartLine, CartError> {
        if !line.is_weighted {
            return Err(CartError::NotWeighed(line.line_id));
        }
        let mut cart = self.cart.lock();
        if cart.get(&line.line_id).is_some() {
            return Err(CartError::DuplicateLine(line.line_id));
        }
        let line = CartLine { quantity: 1, ..line };
        cart.lines.push(line.clone());
        self.persist(&cart);
        tracing::debug!(line_id = %line.line_id, price = line.unit_price, "Weighed line added");
        Ok(line)
    }

    /// Change a line's quantity by `delta`
    ///
    /// Returns the updated line, or `None` when the quantity would fall below 1
    /// and the line was removed instead.
    pub fn adjust_quantity(&self, line_id: &str, delta: i32) -> Result<Option<CartLine>, CartError> {
        let mut cart = self.cart.lock();
        let index = cart
            .lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;

        let line = &mut cart.lines[index];
        if line.is_weighted && delta > 0 {
            return Err(CartError::WeighedLineFixed(line_id.to_string()));
        }

        let next = i64::from(line.quantity) + i64::from(delta);
        let result = if next < 1 {
            cart.lines.remove(index);
            None
        } else {
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
            Some(line.clone())
        };
        self.persist(&cart);
        Ok(result)
    }

    pub fn remove(&self, line_id: &str) -> Result<CartLine, CartError> {
        let mut cart = self.cart.lock();
        let index = cart
            .lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        let removed = cart.lines.remove(index);
        self.persist(&cart);
        Ok(removed)
    }

    /// Empty the cart and forget its snapshot
    pub fn clear(&self) {
        let mut cart = self.cart.lock();
        cart.lines.clear();
        if let Err(e) = self.store.discard() {
            tracing::warn!(error = %e, "Failed to discard cart snapshot");
        }
    }

    /// Take the lines of a paid order out of the cart
    ///
    /// Unit lines lose the quantity that was ordered and weighed lines are
    /// removed by `line_id`. Anything added after `paid` was taken stays in the
    /// cart for the next sale. The snapshot is discarded once nothing is left.
    pub fn settle(&self, paid: &Cart) {
        let mut cart = self.cart.lock();
        for sold in paid.lines() {
            let Some(index) = cart.lines.iter().position(|l| l.line_id == sold.line_id) else {
                continue;
            };
            let line = &mut cart.lines[index];
            if line.is_weighted || line.quantity <= sold.quantity {
                cart.lines.remove(index);
            } else {
                line.quantity -= sold.quantity;
            }
        }

        if cart.lines.is_empty() {
            if let Err(e) = self.store.discard() {
                tracing::warn!(error = %e, "Failed to discard cart snapshot");
            }
        } else {
            tracing::info!(lines = cart.lines.len(), "Lines added during checkout kept in cart");
            self.persist(&cart);
        }
    }

    pub fn snapshot(&self) -> Cart {
        self.cart.lock().clone()
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.cart.lock().lines.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.lock().is_empty()
    }

    pub fn total_amount(&self) -> i64 {
        self.cart.lock().total_amount()
    }

    pub fn total_quantity(&self) -> u64 {
        self.cart.lock().total_quantity()
    }
}

impl SessionListener for CartReconciler {
    fn on_logout(&self) {
        self.clear();
        tracing::info!("Cart cleared on logout");
    }
}
