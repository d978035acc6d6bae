//! Utility modules

pub mod logger;
pub mod money;

pub use logger::{init_logger, init_logger_with_file};
