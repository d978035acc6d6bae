//! Checkout Terminal - supermarket self-checkout core
//!
//! # Overview
//!
//! - **Device poller** (`poller`): polls the bridge for the latest scan and
//!   tells new scans from repeats by timestamp
//! - **Catalog** (`catalog`): in-memory barcode catalog
//! - **Weighing** (`weigh`): PLU lookup, scale reading and weighed pricing
//! - **Cart** (`cart`): serialized cart mutations with a durable snapshot
//! - **Checkout** (`checkout`): cash and wallet order submission
//!
//! # Layout
//!
//! ```text
//! checkout-terminal/src/
//! ├── core/          # config, errors, background tasks
//! ├── utils/         # logging, money
//! ├── poller/        # poll cursor, scan intake, poll loop
//! ├── cart/          # cart reconciler, snapshot store
//! ├── catalog.rs
//! ├── weigh.rs
//! ├── checkout.rs
//! ├── session.rs
//! ├── notice.rs
//! ├── terminal.rs    # composition root
//! └── console.rs     # operator console
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod console;
pub mod core;
pub mod notice;
pub mod poller;
pub mod session;
pub mod terminal;
pub mod utils;
pub mod weigh;

pub use cart::{Cart, CartError, CartReconciler};
pub use catalog::{CatalogSnapshot, Lookup};
pub use checkout::{CheckoutError, CheckoutOutcome, CheckoutState, Receipt};
pub use self::core::{BackgroundTasks, Config, ConfigError, Result, TaskKind, TerminalError};
pub use notice::{Notice, NoticeBus, Severity};
pub use poller::{DevicePoller, PollCursor, PollOutcome, PollerHandle};
pub use session::{Session, SessionListener};
pub use terminal::{Terminal, TerminalBuilder};
pub use weigh::{WeighError, WeightResolver};

pub use utils::logger::{init_logger, init_logger_with_file};
