//! Checkout Client - HTTP clients for the terminal's collaborators
//!
//! Provides network calls to the store backend (catalog, PLU lookup, orders,
//! payments, invoices) and to the device bridge (scanner and scale).

pub mod bridge;
pub mod config;
pub mod error;
pub mod http;

pub use bridge::{BridgeClient, NetworkBridgeClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{BackendClient, NetworkBackendClient};

// Re-export shared types for convenience
pub use shared::client::{LoginResponse, UserInfo};
