//! Core module - configuration, errors and background tasks
//!
//! - [`Config`] - terminal configuration
//! - [`TerminalError`] - aggregate action error
//! - [`BackgroundTasks`] - long-running task registry

pub mod config;
pub mod error;
pub mod tasks;

pub use config::{Config, ConfigError};
pub use error::{Result, TerminalError};
pub use tasks::{BackgroundTasks, TaskKind};
