//! Background tasks
//!
//! The terminal runs three long-lived tasks: the catalog warmup, the device
//! poller and the console's notice printer. They share one shutdown token and
//! a panic in any of them is logged rather than taking the process down.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Finishes on its own once its work is done
    Warmup,
    /// Fixed-cadence loop
    Periodic,
    /// Event listener
    Listener,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Warmup => "warmup",
            TaskKind::Periodic => "periodic",
            TaskKind::Listener => "listener",
        }
    }

    /// Whether finishing before shutdown means something went wrong
    fn runs_until_shutdown(self) -> bool {
        self != TaskKind::Warmup
    }
}

struct Task {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Vec<Task>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if kind.runs_until_shutdown() && !shutdown.is_cancelled() => {
                    tracing::warn!(task = name, kind = kind.as_str(), "Task exited before shutdown");
                }
                Ok(()) => {}
                Err(payload) => {
                    tracing::error!(
                        task = name,
                        kind = kind.as_str(),
                        panic = %panic_message(payload.as_ref()),
                        "Task panicked"
                    );
                }
            }
        });
        tracing::debug!(task = name, kind = kind.as_str(), "Task started");
        self.tasks.push(Task { name, kind, handle });
    }

    /// Names of loops and listeners that are no longer running
    pub fn stopped(&self) -> Vec<&'static str> {
        if self.shutdown.is_cancelled() {
            return Vec::new();
        }
        self.tasks
            .iter()
            .filter(|t| t.kind.runs_until_shutdown() && t.handle.is_finished())
            .map(|t| t.name)
            .collect()
    }

    /// Cancel every task and wait for it to finish
    pub async fn shutdown(self) {
        tracing::info!(count = self.tasks.len(), "Stopping background tasks");
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::error!(task = task.name, error = ?e, "Task join failed");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
