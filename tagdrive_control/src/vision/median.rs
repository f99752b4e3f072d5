//! Fixed-capacity moving median filter.
//!
//! Storage is a `heapless::Deque`, so pushing a sample never allocates.
//! The window size is chosen at construction (`1..=MAX_FILTER_WINDOW`);
//! until the window fills, the median is taken over the samples seen so
//! far. An even count returns the mean of the two middle samples.

use heapless::{Deque, Vec};
use tagdrive_common::consts::MAX_FILTER_WINDOW;

/// Moving median over the last `window` samples.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: usize,
    samples: Deque<f64, MAX_FILTER_WINDOW>,
}

impl MedianFilter {
    /// Create a filter; `window` is clamped into `1..=MAX_FILTER_WINDOW`.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.clamp(1, MAX_FILTER_WINDOW),
            samples: Deque::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Push `input` and return the median of the current window.
    pub fn calculate(&mut self, input: f64) -> f64 {
        if self.samples.len() >= self.window {
            self.samples.pop_front();
        }
        // Cannot fail: len < window <= capacity after the pop above.
        let _ = self.samples.push_back(input);

        let mut sorted: Vec<f64, MAX_FILTER_WINDOW> = self.samples.iter().copied().collect();
        sorted.sort_unstable_by(f64::total_cmp);

        let n = sorted.len();
        if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        }
    }

    /// Drop all samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
