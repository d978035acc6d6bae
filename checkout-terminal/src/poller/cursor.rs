//! Poll cursor
//!
//! The bridge only ever reports its latest scan, so the terminal tells new
//! scans from old ones by the event timestamp. The first timestamp seen after
//! start (or after a reset) belongs to a scan that happened before this cart
//! existed and is recorded without being acted on.

use shared::models::ScanTimestamp;

/// What a polled timestamp means for the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First read after start or reset; recorded, not processed
    Baseline,
    /// Same event as last time
    Stale,
    /// A new scan to process
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCursor {
    cursor: Option<ScanTimestamp>,
    armed_for_baseline: bool,
}

impl PollCursor {
    pub fn new() -> Self {
        Self {
            cursor: None,
            armed_for_baseline: true,
        }
    }

    pub fn observe(&mut self, ts: &ScanTimestamp) -> Observation {
        if self.armed_for_baseline {
            self.armed_for_baseline = false;
            self.cursor = Some(ts.clone());
            return Observation::Baseline;
        }
        if self.cursor.as_ref() == Some(ts) {
            return Observation::Stale;
        }
        self.cursor = Some(ts.clone());
        Observation::Fresh
    }

    /// Forget the last event and treat the next read as a baseline again
    pub fn reset(&mut self) {
        self.cursor = None;
        self.armed_for_baseline = true;
    }

    pub fn last_seen(&self) -> Option<&ScanTimestamp> {
        self.cursor.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed_for_baseline
    }
}

impl Default for PollCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> ScanTimestamp {
        ScanTimestamp::new(raw)
    }

    #[test]
    fn test_first_read_is_baseline() {
        let mut cursor = PollCursor::new();
        assert!(cursor.is_armed());
        assert_eq!(cursor.observe(&ts("1700000000.5")), Observation::Baseline);
        assert!(!cursor.is_armed());
        assert_eq!(cursor.last_seen(), Some(&ts("1700000000.5")));
    }

    #[test]
    fn test_same_timestamp_is_stale() {
        let mut cursor = PollCursor::new();
        cursor.observe(&ts("1"));
        assert_eq!(cursor.observe(&ts("1")), Observation::Stale);
        assert_eq!(cursor.observe(&ts("1")), Observation::Stale);
    }

    #[test]
    fn test_new_timestamp_is_fresh_once() {
        let mut cursor = PollCursor::new();
        cursor.observe(&ts("1"));
        assert_eq!(cursor.observe(&ts("2")), Observation::Fresh);
        assert_eq!(cursor.observe(&ts("2")), Observation::Stale);
        // equality only, not ordering
        assert_eq!(cursor.observe(&ts("1")), Observation::Fresh);
    }

    #[test]
    fn test_reset_rearms_baseline() {
        let mut cursor = PollCursor::new();
        cursor.observe(&ts("1"));
        cursor.observe(&ts("2"));

        cursor.reset();
        assert_eq!(cursor.last_seen(), None);
        assert_eq!(cursor.observe(&ts("3")), Observation::Baseline);
        assert_eq!(cursor.observe(&ts("3")), Observation::Stale);
        assert_eq!(cursor.observe(&ts("4")), Observation::Fresh);
    }
}
