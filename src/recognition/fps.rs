//! Frame-rate estimation.

use std::collections::VecDeque;
use std::time::Instant;

/// Source of the frames-per-second readout drawn on each displayed frame.
pub trait FpsEstimator: Send {
    /// Registers a frame and returns the current rate.
    fn current_fps(&mut self) -> f64;
}

/// Rolling-window estimator over the most recent frame instants.
///
/// Reports `(n - 1) / span` across the last `n` recorded frames, and 0.0
/// until at least two frames have been recorded.
#[derive(Debug, Clone)]
pub struct RollingFps {
    window: usize,
    stamps: VecDeque<Instant>,
}

impl RollingFps {
    /// Creates an estimator spanning up to `window` frames (minimum 2).
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            window,
            stamps: VecDeque::with_capacity(window),
        }
    }

    /// Records a frame observed at `at` and returns the updated rate.
    pub fn record_at(&mut self, at: Instant) -> f64 {
        if self.stamps.len() == self.window {
            self.stamps.pop_front();
        }
        self.stamps.push_back(at);
        self.fps()
    }

    /// Returns the rate without recording a frame.
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.stamps.front(), self.stamps.back()) else {
            return 0.0;
        };
        let span = last.saturating_duration_since(*first).as_secs_f64();
        if self.stamps.len() < 2 || span <= 0.0 {
            return 0.0;
        }
        (self.stamps.len() - 1) as f64 / span
    }

    /// Forgets all recorded frames.
    pub fn reset(&mut self) {
        self.stamps.clear();
    }
}

impl Default for RollingFps {
    fn default() -> Self {
        Self::new(30)
    }
}

impl FpsEstimator for RollingFps {
    fn current_fps(&mut self) -> f64 {
        self.record_at(Instant::now())
    }
}
