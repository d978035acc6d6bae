//! Checkout submission
//!
//! Submits the cart as an order. Cash orders are paid on the spot: the ordered
//! lines leave the cart, deferred scans are dropped and the poll cursor is
//! re-baselined. Lines added while the order was in flight stay for the next
//! sale. Wallet orders are created pending
//! and hand back the wallet's payment URL; the cart stays as it is until the
//! wallet flow completes elsewhere. A failed submission changes nothing.

use std::sync::Arc;
use std::time::Duration;

use checkout_client::{BackendClient, ClientError};
use parking_lot::Mutex;
use shared::models::{CartLine, OrderItem, OrderRequest, PaymentMethod, PaymentRequest};
use thiserror::Error;

use crate::cart::{Cart, CartReconciler};
use crate::notice::NoticeBus;
use crate::poller::{PollerHandle, ScanIntake};
use crate::session::Session;

const ORDER_INFO: &str = "Supermarket order payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    Paid,
    Redirecting,
    Failed,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("A checkout is already being submitted")]
    InProgress,

    #[error("Order submission failed: {0}")]
    Order(#[source] ClientError),

    #[error("Payment request failed: {0}")]
    Payment(#[source] ClientError),

    #[error("Payment service returned no payment URL")]
    MissingPayUrl,
}

/// Confirmation of a cash sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub order_id: String,
    pub lines: Vec<CartLine>,
    pub total_quantity: u64,
    pub total_amount: i64,
    /// As awarded by the backend
    pub points_earned: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Paid(Receipt),
    /// Customer continues on the wallet's payment page
    Redirect { order_id: String, pay_url: String },
}

/// Where the wallet sends the customer and its settlement callback
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub redirect_url: String,
    pub ipn_url: String,
    pub cursor_reset_delay: Duration,
}

pub struct CheckoutSubmitter {
    backend: Arc<dyn BackendClient>,
    cart: Arc<CartReconciler>,
    intake: Arc<ScanIntake>,
    session: Arc<Session>,
    poller: PollerHandle,
    notices: NoticeBus,
    options: CheckoutOptions,
    state: Mutex<CheckoutState>,
}

impl CheckoutSubmitter {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        cart: Arc<CartReconciler>,
        intake: Arc<ScanIntake>,
        session: Arc<Session>,
        poller: PollerHandle,
        notices: NoticeBus,
        options: CheckoutOptions,
    ) -> Self {
        Self {
            backend,
            cart,
            intake,
            session,
            poller,
            notices,
            options,
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    pub fn state(&self) -> CheckoutState {
        *self.state.lock()
    }

    fn set_state(&self, state: CheckoutState) {
        *self.state.lock() = state;
    }

    pub async fn submit(&self, method: PaymentMethod) -> Result<CheckoutOutcome, CheckoutError> {
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            self.notices.warning("Cart is empty");
            return Err(CheckoutError::EmptyCart);
        }

        {
            let mut state = self.state.lock();
            if *state == CheckoutState::Submitting {
                return Err(CheckoutError::InProgress);
            }
            *state = CheckoutState::Submitting;
        }

        let identity = self.session.identity();
        let request = OrderRequest {
            cart: cart.lines().iter().map(OrderItem::from).collect(),
            total_amount: cart.total_amount(),
            payment_method: method,
            status: method.initial_status(),
            is_guest: identity.is_guest(),
            user_id: identity.user_id().map(str::to_owned),
        };
        tracing::info!(
            method = %method,
            lines = request.cart.len(),
            total = request.total_amount,
            guest = request.is_guest,
            "Submitting order"
        );

        let result = match method {
            PaymentMethod::Cash => self.pay_cash(&request, identity.token(), &cart).await,
            PaymentMethod::Wallet => self.pay_wallet(&request, identity.token()).await,
        };

        match &result {
            Ok(CheckoutOutcome::Paid(_)) => self.set_state(CheckoutState::Paid),
            Ok(CheckoutOutcome::Redirect { .. }) => self.set_state(CheckoutState::Redirecting),
            Err(e) => {
                self.set_state(CheckoutState::Failed);
                tracing::error!(method = %method, error = %e, "Checkout failed");
                self.notices.error(format!("Payment failed: {e}"));
            }
        }
        result
    }

    async fn pay_cash(
        &self,
        request: &OrderRequest,
        token: Option<&str>,
        cart: &Cart,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let created = self
            .backend
            .create_order(request, token)
            .await
            .map_err(CheckoutError::Order)?;

        let receipt = Receipt {
            order_id: created.id,
            lines: cart.lines().to_vec(),
            total_quantity: cart.total_quantity(),
            total_amount: cart.total_amount(),
            points_earned: created.points_earned,
        };

        self.cart.settle(cart);
        self.intake.discard_pending();
        self.notices.success("Payment successful");
        tracing::info!(order_id = %receipt.order_id, points = receipt.points_earned, "Cash order paid");

        // The bridge still reports the last scan of this sale; re-baseline
        tokio::time::sleep(self.options.cursor_reset_delay).await;
        self.poller.reset_cursor();

        Ok(CheckoutOutcome::Paid(receipt))
    }

    async fn pay_wallet(
        &self,
        request: &OrderRequest,
        token: Option<&str>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let created = self
            .backend
            .create_order(request, token)
            .await
            .map_err(CheckoutError::Order)?;

        let payment = PaymentRequest {
            order_id: created.id.clone(),
            order_info: ORDER_INFO.to_string(),
            redirect_url: self.options.redirect_url.clone(),
            ipn_url: self.options.ipn_url.clone(),
            amount: request.total_amount.to_string(),
        };
        let response = self
            .backend
            .create_payment(&payment, token)
            .await
            .map_err(CheckoutError::Payment)?;

        let pay_url = response
            .pay_url()
            .map(str::to_owned)
            .ok_or(CheckoutError::MissingPayUrl)?;

        tracing::info!(order_id = %created.id, "Wallet payment created, redirecting");
        Ok(CheckoutOutcome::Redirect {
            order_id: created.id,
            pay_url,
        })
    }
}
