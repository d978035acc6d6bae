//! Data models
//!
//! Shared between the checkout client and the terminal. Field names follow
//! the backend's camelCase JSON; Mongo-style `_id` keys map to `id`.

pub mod cart;
pub mod device;
pub mod order;
pub mod payment;
pub mod product;
pub mod store_info;

// Re-exports
pub use cart::*;
pub use device::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use store_info::*;
