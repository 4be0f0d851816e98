//! Temporal filter for camera frames.
//!
//! A camera decoder reports the same label on every frame while it stays in
//! view. The classifier's duplicate detection is by tag, so without this
//! filter a single held label would flood the event log with `Duplicate`
//! entries. Manual entries bypass the filter entirely.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default suppression window for repeated camera frames.
pub const DEFAULT_FRAME_WINDOW: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct FrameDebouncer {
    window: Duration,
    last_seen: HashMap<String, Instant>,
}

impl FrameDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Returns `true` when a frame carrying `code` should reach the
    /// classifier.
    ///
    /// The window slides: every frame of a code, admitted or not, restarts
    /// its quiet period, so a label held in front of the lens is delivered
    /// once.
    pub fn admit(&mut self, code: &str, at: Instant) -> bool {
        self.prune(at);
        let admitted = match self.last_seen.get(code) {
            Some(previous) => at.saturating_duration_since(*previous) >= self.window,
            None => true,
        };
        self.last_seen.insert(code.to_string(), at);
        admitted
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);
    }
}

impl Default for FrameDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_inside_window_is_suppressed() {
        let mut debouncer = FrameDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit("A", t0));
        assert!(!debouncer.admit("A", t0 + Duration::from_millis(200)));
        assert!(!debouncer.admit("A", t0 + Duration::from_millis(1400)));
    }

    #[test]
    fn test_held_label_keeps_extending_window() {
        let mut debouncer = FrameDebouncer::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(debouncer.admit("A", t0));
        for step in 1..=10 {
            let at = t0 + Duration::from_millis(step * 500);
            assert!(!debouncer.admit("A", at), "frame {} should be suppressed", step);
        }
        assert!(debouncer.admit("A", t0 + Duration::from_millis(6500)));
    }

    #[test]
    fn test_distinct_codes_are_independent() {
        let mut debouncer = FrameDebouncer::default();
        let t0 = Instant::now();

        assert!(debouncer.admit("A", t0));
        assert!(debouncer.admit("B", t0 + Duration::from_millis(10)));
        assert!(!debouncer.admit("A", t0 + Duration::from_millis(20)));
    }
}
