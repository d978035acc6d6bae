use std::path::PathBuf;
use std::time::Duration;

use checkout_client::ClientConfig;
use thiserror::Error;

/// Terminal configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file in the
/// working directory is loaded first):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./terminal-data | cart snapshot, invoices |
/// | BACKEND_URL | http://localhost:5000 | store backend |
/// | BRIDGE_URL | http://localhost:5001 | scanner/scale bridge |
/// | PAYMENT_URL | http://localhost:5002 | wallet payment service |
/// | POLL_INTERVAL_MS | 1000 | last-barcode poll cadence |
/// | BRIDGE_POLL_TIMEOUT_MS | 5000 | timeout of a single poll |
/// | WEIGH_TIMEOUT_MS | 15000 | timeout of a weigh request |
/// | REQUEST_TIMEOUT_MS | 30000 | backend/payment request timeout |
/// | CURSOR_RESET_DELAY_MS | 100 | delay before rebasing the scan cursor after a cash sale |
/// | CATALOG_RETRY_MS | 5000 | retry interval while the catalog cannot be loaded |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | (unset) | rolling log directory; logs go to stdout when unset |
///
/// ```ignore
/// BRIDGE_URL=http://raspberrypi.local:5000 cargo run -p checkout-terminal
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub backend_url: String,
    pub bridge_url: String,
    pub payment_url: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub weigh_timeout: Duration,
    pub request_timeout: Duration,
    pub cursor_reset_delay: Duration,
    pub catalog_retry: Duration,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

/// Configuration that cannot run a terminal
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not an http(s) URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

fn env_millis(name: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "./terminal-data".into())
                .into(),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            bridge_url: std::env::var("BRIDGE_URL")
                .unwrap_or_else(|_| "http://localhost:5001".into()),
            payment_url: std::env::var("PAYMENT_URL")
                .unwrap_or_else(|_| "http://localhost:5002".into()),
            poll_interval: env_millis("POLL_INTERVAL_MS", 1000),
            poll_timeout: env_millis("BRIDGE_POLL_TIMEOUT_MS", 5000),
            weigh_timeout: env_millis("WEIGH_TIMEOUT_MS", 15000),
            request_timeout: env_millis("REQUEST_TIMEOUT_MS", 30000),
            cursor_reset_delay: env_millis("CURSOR_RESET_DELAY_MS", 100),
            catalog_retry: env_millis("CATALOG_RETRY_MS", 5000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
        }
    }

    /// Reject configurations the terminal cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("BACKEND_URL", &self.backend_url),
            ("BRIDGE_URL", &self.bridge_url),
            ("PAYMENT_URL", &self.payment_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    name,
                    value: value.clone(),
                });
            }
        }
        for (name, value) in [
            ("POLL_INTERVAL_MS", self.poll_interval),
            ("BRIDGE_POLL_TIMEOUT_MS", self.poll_timeout),
            ("WEIGH_TIMEOUT_MS", self.weigh_timeout),
            ("REQUEST_TIMEOUT_MS", self.request_timeout),
            ("CATALOG_RETRY_MS", self.catalog_retry),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        Ok(())
    }

    /// Client settings for the backend and bridge
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.backend_url, &self.bridge_url, &self.payment_url)
            .with_request_timeout(self.request_timeout)
            .with_poll_timeout(self.poll_timeout)
            .with_weigh_timeout(self.weigh_timeout)
    }

    /// Durable cart snapshot location
    pub fn cart_snapshot_path(&self) -> PathBuf {
        self.work_dir.join("cart.json")
    }

    /// Where downloaded invoices are written
    pub fn invoice_dir(&self) -> PathBuf {
        self.work_dir.join("invoices")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
