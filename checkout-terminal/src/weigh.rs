//! Weight resolver
//!
//! Turns a PLU code and a scale reading into a weighed cart line:
//! look the code up, ask the bridge to weigh, price the reading, commit.
//! Every change of the working code bumps a generation counter; a reading that
//! comes back for an older generation is discarded.

use std::sync::Arc;

use checkout_client::{BackendClient, BridgeClient, ClientError};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{CartLine, ProduceItem};
use thiserror::Error;

use crate::cart::{CartError, CartReconciler};
use crate::notice::{NoticeBus, Severity};
use crate::utils::money;

#[derive(Debug, Error)]
pub enum WeighError {
    #[error("Enter a PLU code first")]
    MissingCode,

    #[error("No produce item with PLU code {0}")]
    UnknownCode(String),

    #[error("Scale returned an invalid weight")]
    InvalidWeight,

    #[error("Nothing weighed yet")]
    NoReading,

    #[error("Reading discarded, the PLU code changed while weighing")]
    Superseded,

    #[error("PLU lookup failed: {0}")]
    Lookup(#[source] ClientError),

    #[error("Scale request failed: {0}")]
    Bridge(#[source] ClientError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Price of {0} does not fit the currency range")]
    PriceOverflow(String),
}

impl WeighError {
    fn severity(&self) -> Option<Severity> {
        match self {
            WeighError::Superseded => None,
            WeighError::MissingCode
            | WeighError::UnknownCode(_)
            | WeighError::InvalidWeight
            | WeighError::NoReading => Some(Severity::Warning),
            WeighError::Lookup(_)
            | WeighError::Bridge(_)
            | WeighError::Cart(_)
            | WeighError::PriceOverflow(_) => Some(Severity::Error),
        }
    }
}

/// A validated reading waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeighedItem {
    pub item: ProduceItem,
    pub weight_kg: Decimal,
}

#[derive(Debug, Default)]
struct WeighState {
    plu_code: Option<String>,
    reading: Option<WeighedItem>,
    generation: u64,
}

pub struct WeightResolver {
    backend: Arc<dyn BackendClient>,
    bridge: Arc<dyn BridgeClient>,
    cart: Arc<CartReconciler>,
    notices: NoticeBus,
    state: Mutex<WeighState>,
}

impl WeightResolver {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        bridge: Arc<dyn BridgeClient>,
        cart: Arc<CartReconciler>,
        notices: NoticeBus,
    ) -> Self {
        Self {
            backend,
            bridge,
            cart,
            notices,
            state: Mutex::new(WeighState::default()),
        }
    }

    /// Set the working PLU code; any reading in flight becomes stale
    pub fn select_code(&self, code: &str) {
        let mut state = self.state.lock();
        state.plu_code = Some(code.trim().to_string());
        state.reading = None;
        state.generation += 1;
    }

    /// Operator left PLU mode
    pub fn leave(&self) {
        let mut state = self.state.lock();
        state.plu_code = None;
        state.reading = None;
        state.generation += 1;
    }

    pub fn current_code(&self) -> Option<String> {
        self.state.lock().plu_code.clone()
    }

    pub fn pending_reading(&self) -> Option<WeighedItem> {
        self.state.lock().reading.clone()
    }

    /// Look up the working code and weigh it
    pub async fn weigh(&self) -> Result<WeighedItem, WeighError> {
        let result = self.weigh_inner().await;
        self.report(result)
    }

    async fn weigh_inner(&self) -> Result<WeighedItem, WeighError> {
        let (code, generation) = {
            let state = self.state.lock();
            let code = state
                .plu_code
                .clone()
                .filter(|c| !c.is_empty())
                .ok_or(WeighError::MissingCode)?;
            (code, state.generation)
        };

        let item = self
            .backend
            .find_produce(&code)
            .await
            .map_err(WeighError::Lookup)?
            .ok_or_else(|| WeighError::UnknownCode(code.clone()))?;

        let reading = self
            .bridge
            .start_weigh(&code)
            .await
            .map_err(WeighError::Bridge)?;

        let weight_kg = reading
            .weight_kg()
            .filter(|w| *w > Decimal::ZERO)
            .ok_or(WeighError::InvalidWeight)?;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(plu = %code, "Discarding reading for a stale PLU code");
            return Err(WeighError::Superseded);
        }
        let weighed = WeighedItem { item, weight_kg };
        state.reading = Some(weighed.clone());
        tracing::info!(plu = %code, weight_kg = %weight_kg, "Scale reading accepted");
        Ok(weighed)
    }

    /// Add the pending reading to the cart as its own line
    pub fn commit(&self) -> Result<CartLine, WeighError> {
        let result = self.commit_inner();
        self.report(result)
    }

    fn commit_inner(&self) -> Result<CartLine, WeighError> {
        let mut state = self.state.lock();
        let WeighedItem { item, weight_kg } = state.reading.clone().ok_or(WeighError::NoReading)?;

        let unit_price = money::weighed_price(item.price_per_kg, weight_kg)
            .ok_or_else(|| WeighError::PriceOverflow(item.name.clone()))?;

        let line = CartLine {
            line_id: uuid::Uuid::new_v4().to_string(),
            product_id: item.id.clone(),
            name: item.name.clone(),
            unit_price,
            quantity: 1,
            is_weighted: true,
            weight_grams: Some(money::grams(weight_kg)),
            weight_kg: Some(weight_kg),
            price_per_kg: Some(item.price_per_kg),
            plu_code: Some(item.plu_code.clone()),
        };
        let line = self.cart.add_weighed(line)?;

        state.plu_code = None;
        state.reading = None;
        state.generation += 1;
        drop(state);

        self.notices.success(format!(
            "Added {} ({} g)",
            line.name,
            line.weight_grams.unwrap_or_default()
        ));
        Ok(line)
    }

    /// Select, weigh and commit in one action
    pub async fn add_by_plu(&self, code: &str) -> Result<CartLine, WeighError> {
        self.select_code(code);
        self.weigh().await?;
        self.commit()
    }

    fn report<T>(&self, result: Result<T, WeighError>) -> Result<T, WeighError> {
        if let Err(e) = &result {
            match e.severity() {
                Some(Severity::Error) => {
                    tracing::error!(error = %e, "Weighing failed");
                    self.notices.error(e.to_string());
                }
                Some(severity) => self.notices.publish(severity, e.to_string()),
                None => {}
            }
        }
        result
    }
}

impl crate::session::SessionListener for WeightResolver {
    fn on_logout(&self) {
        self.leave();
    }
}
