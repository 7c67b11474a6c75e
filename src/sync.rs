//! Per-frame resolution of the word currently being spoken.

use crate::timing::Timeline;

/// Tracks the active token across frames.
///
/// Each [`tick`](SyncLoop::tick) reads one clock value:
/// - a word containing the time becomes active (`start <= t < end`);
/// - at or past the end of the last word, nothing is active;
/// - in a gap between words, the previous answer is kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncLoop {
    active: Option<usize>,
}

impl SyncLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Resolve the active token at `current_time`. Returns true if it changed.
    pub fn tick(&mut self, timeline: &Timeline, current_time: f64) -> bool {
        let next = match timeline.token_at(current_time) {
            Some(id) => Some(id),
            None if current_time >= timeline.end() => None,
            None => self.active,
        };
        let changed = next != self.active;
        if changed {
            log::trace!("Active token {:?} -> {:?} at {current_time:.3}s", self.active, next);
        }
        self.active = next;
        changed
    }

    /// Clear the active token (playback stopped).
    pub fn reset(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TextToken;

    fn word(id: usize, start: f64, end: f64) -> TextToken {
        TextToken {
            id,
            text: "w".to_string(),
            is_word: true,
            start: Some(start),
            end: Some(end),
        }
    }

    fn gap(id: usize) -> TextToken {
        TextToken {
            id,
            text: " ".to_string(),
            is_word: false,
            start: None,
            end: None,
        }
    }

    #[test]
    fn resolves_with_half_open_boundaries() {
        let timeline = Timeline::new(vec![word(0, 0.0, 1.0), word(1, 1.0, 2.0)]);
        let mut sync = SyncLoop::new();

        sync.tick(&timeline, 0.5);
        assert_eq!(sync.active(), Some(0));
        sync.tick(&timeline, 1.0);
        assert_eq!(sync.active(), Some(1));
        sync.tick(&timeline, 2.0);
        assert_eq!(sync.active(), None);
    }

    #[test]
    fn gaps_keep_the_previous_word() {
        let timeline = Timeline::new(vec![word(0, 0.0, 1.0), gap(1), word(2, 1.5, 2.0)]);
        let mut sync = SyncLoop::new();

        sync.tick(&timeline, 0.9);
        assert!(!sync.tick(&timeline, 1.2));
        assert_eq!(sync.active(), Some(0));
        assert!(sync.tick(&timeline, 1.5));
        assert_eq!(sync.active(), Some(2));
    }

    #[test]
    fn before_the_first_word_nothing_is_active() {
        let timeline = Timeline::new(vec![word(0, 0.5, 1.0)]);
        let mut sync = SyncLoop::new();
        assert!(!sync.tick(&timeline, 0.1));
        assert_eq!(sync.active(), None);
    }

    #[test]
    fn reports_changes_only() {
        let timeline = Timeline::estimate("one two", 2.0);
        let mut sync = SyncLoop::new();
        assert!(sync.tick(&timeline, 0.1));
        assert!(!sync.tick(&timeline, 0.2));
        assert!(sync.reset());
        assert!(!sync.reset());
    }

    #[test]
    fn degenerate_timelines_never_activate() {
        for timeline in [
            Timeline::estimate("Hello, world!", 0.0),
            Timeline::estimate("?!... ,", 3.0),
            Timeline::estimate("", 3.0),
        ] {
            let mut sync = SyncLoop::new();
            for step in 0..50 {
                sync.tick(&timeline, f64::from(step) * 0.1);
                assert_eq!(sync.active(), None);
            }
        }
    }
}
