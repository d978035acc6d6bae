//! Device poller
//!
//! Polls the bridge for its latest scan on a fixed cadence. A single task owns
//! the loop and awaits each poll before the next tick, so polls never overlap.
//! Bridge failures are logged and the next tick simply tries again.

pub mod cursor;
pub mod intake;

use std::sync::Arc;
use std::time::Duration;

use checkout_client::BridgeClient;
use parking_lot::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::session::SessionListener;
pub use cursor::{Observation, PollCursor};
pub use intake::{IntakeOutcome, PENDING_SCAN_CAPACITY, ScanIntake};

/// What one poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Bridge answered without a usable scan
    NoEvent,
    /// First read after start or reset, recorded only
    Baseline,
    Stale,
    Processed(IntakeOutcome),
    /// Bridge unreachable, timed out or answered garbage
    TransportError,
}

#[derive(Debug, Default)]
struct PollerState {
    cursor: Mutex<PollCursor>,
    last_barcode: RwLock<Option<String>>,
    /// Cancelled when the session ends; replaced for the next session
    session: Mutex<CancellationToken>,
}

/// Cloneable handle to the poller's cursor, used by checkout and logout
#[derive(Debug, Clone, Default)]
pub struct PollerHandle {
    state: Arc<PollerState>,
}

impl PollerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank the cursor and the displayed barcode; the next read becomes a
    /// baseline again
    pub fn reset_cursor(&self) {
        self.state.cursor.lock().reset();
        *self.state.last_barcode.write() = None;
        tracing::debug!("Poll cursor reset");
    }

    pub fn last_observed_barcode(&self) -> Option<String> {
        self.state.last_barcode.read().clone()
    }

    /// Stop polling for the current session and start over for the next one
    pub fn end_session(&self) {
        let previous = std::mem::take(&mut *self.state.session.lock());
        previous.cancel();
        self.reset_cursor();
    }

    fn session_token(&self) -> CancellationToken {
        self.state.session.lock().clone()
    }

    pub fn cursor(&self) -> PollCursor {
        self.state.cursor.lock().clone()
    }

    fn observe(&self, ts: &shared::models::ScanTimestamp) -> Observation {
        self.state.cursor.lock().observe(ts)
    }

    fn set_last_barcode(&self, barcode: &str) {
        *self.state.last_barcode.write() = Some(barcode.to_string());
    }
}

impl SessionListener for PollerHandle {
    fn on_logout(&self) {
        self.end_session();
    }
}

pub struct DevicePoller {
    bridge: Arc<dyn BridgeClient>,
    intake: Arc<ScanIntake>,
    handle: PollerHandle,
    interval: Duration,
}

impl DevicePoller {
    pub fn new(
        bridge: Arc<dyn BridgeClient>,
        intake: Arc<ScanIntake>,
        handle: PollerHandle,
        interval: Duration,
    ) -> Self {
        Self {
            bridge,
            intake,
            handle,
            interval,
        }
    }

    pub fn handle(&self) -> &PollerHandle {
        &self.handle
    }

    /// One poll of the bridge
    pub async fn poll_once(&self) -> PollOutcome {
        let event = match self.bridge.last_scan().await {
            Ok(event) => event,
            Err(e) if e.is_timeout() => {
                tracing::debug!("Bridge poll timed out");
                return PollOutcome::TransportError;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bridge poll failed");
                return PollOutcome::TransportError;
            }
        };

        let Some((barcode, ts)) = event.usable() else {
            return PollOutcome::NoEvent;
        };

        match self.handle.observe(ts) {
            Observation::Baseline => {
                tracing::debug!(barcode, ts = %ts, "Baseline scan recorded");
                PollOutcome::Baseline
            }
            Observation::Stale => PollOutcome::Stale,
            Observation::Fresh => {
                tracing::debug!(barcode, ts = %ts, "Fresh scan");
                self.handle.set_last_barcode(barcode);
                PollOutcome::Processed(self.intake.accept(barcode))
            }
        }
    }

    /// Poll until cancelled
    ///
    /// Each session gets its own interval; ending the session clears it and
    /// the next session starts a fresh one.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Device poller started");

        while !shutdown.is_cancelled() {
            let session = self.handle.session_token();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.poll_session(&session) => {}
            }
            tracing::info!("Session ended, polling restarts for the next session");
        }

        tracing::info!("Device poller stopped");
    }

    async fn poll_session(&self, session: &CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = session.cancelled() => return,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = session.cancelled() => return,
                _ = self.poll_once() => {}
            }
        }
    }
}
