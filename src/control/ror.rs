//! Rate-of-rise estimator.
//!
//! Keeps the last N `(timestamp, temperature)` pairs in a fixed-capacity
//! ring and reports the end-to-end slope across the window in °C per
//! minute.  A two-point slope is enough here: samples are already
//! rate-limited by the control interval.

use embassy_time::Instant;
use heapless::Deque;

use super::secs_f64;

/// Hard upper bound on window length (stack-allocated ring).
pub const MAX_ROR_WINDOW: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RorPoint {
    at: Instant,
    temperature: f64,
}

/// Sliding-window rate-of-rise estimator.
pub struct RateOfRiseEstimator {
    window: Deque<RorPoint, MAX_ROR_WINDOW>,
    /// Configured window length, `2..=MAX_ROR_WINDOW`.
    span: usize,
    latest: f64,
}

impl RateOfRiseEstimator {
    /// `span` is clamped into `2..=MAX_ROR_WINDOW`.
    pub fn new(span: usize) -> Self {
        Self {
            window: Deque::new(),
            span: span.clamp(2, MAX_ROR_WINDOW),
            latest: 0.0,
        }
    }

    /// Push a reading, evicting the oldest when full, and return the new
    /// rate-of-rise.
    pub fn update(&mut self, at: Instant, temperature: f64) -> f64 {
        while self.window.len() >= self.span {
            self.window.pop_front();
        }
        // Cannot fail: we just made room.
        let _ = self.window.push_back(RorPoint { at, temperature });
        self.latest = self.compute();
        self.latest
    }

    /// Last computed rate-of-rise (°C/min).
    pub fn rate_of_rise(&self) -> f64 {
        self.latest
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Drop every stored reading.
    pub fn clear(&mut self) {
        self.window.clear();
        self.latest = 0.0;
    }

    fn compute(&self) -> f64 {
        let (Some(oldest), Some(newest)) = (self.window.front(), self.window.back()) else {
            return 0.0;
        };
        if self.window.len() < 2 {
            return 0.0;
        }
        let dt = secs_f64(newest.at.saturating_duration_since(oldest.at));
        if dt <= 0.0 {
            return 0.0;
        }
        (newest.temperature - oldest.temperature) / dt * 60.0
    }
}
