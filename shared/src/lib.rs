//! Shared types for the checkout terminal
//!
//! Wire and domain types used by both the backend/bridge client and the
//! terminal core.

pub mod client;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::{Identity, LoginRequest, LoginResponse, UserInfo};
