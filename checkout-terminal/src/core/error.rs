use checkout_client::ClientError;
use thiserror::Error;

use crate::cart::CartError;
use crate::cart::store::StoreError;
use crate::checkout::CheckoutError;
use crate::core::config::ConfigError;
use crate::weigh::WeighError;

/// Any failure a terminal action can report
#[derive(Error, Debug)]
pub enum TerminalError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Weigh(#[from] WeighError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerminalError>;
