//! Operator notices
//!
//! The terminal never renders anything itself. Everything the operator should
//! see ("added Milk", "unknown product", "payment failed") is published here
//! with a severity and picked up by whatever front end subscribed.

use std::fmt;

use tokio::sync::broadcast;

const NOTICE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "SUCCESS",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Fan-out channel of operator notices
///
/// Publishing with no subscriber is fine; the notice is dropped.
#[derive(Debug, Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, severity: Severity, message: impl Into<String>) {
        let notice = Notice {
            severity,
            message: message.into(),
        };
        tracing::debug!(severity = %notice.severity, message = %notice.message, "Notice");
        let _ = self.tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Severity::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Severity::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Severity::Error, message);
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = NoticeBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.warning("Unknown product");

        for rx in [&mut a, &mut b] {
            let notice = rx.try_recv().unwrap();
            assert_eq!(notice.severity, Severity::Warning);
            assert_eq!(notice.message, "Unknown product");
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let bus = NoticeBus::new();
        bus.error("nobody listening");
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_display() {
        let notice = Notice {
            severity: Severity::Success,
            message: "Added Milk".into(),
        };
        assert_eq!(notice.to_string(), "[SUCCESS] Added Milk");
    }
}
