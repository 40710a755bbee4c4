//! Roast stopwatch.
//!
//! Starts `Stopped`; [`StopwatchTimer::reset`] always (re)starts it.  There
//! is no stop transition.

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopwatchState {
    Stopped,
    Running { started_at: Instant },
}

#[derive(Debug, Clone)]
pub struct StopwatchTimer {
    state: StopwatchState,
}

impl Default for StopwatchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StopwatchTimer {
    pub fn new() -> Self {
        Self {
            state: StopwatchState::Stopped,
        }
    }

    /// Restart from zero at `now`, whatever the previous state.
    pub fn reset(&mut self, now: Instant) {
        self.state = StopwatchState::Running { started_at: now };
    }

    /// Zero while stopped, `now - started_at` while running.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.state {
            StopwatchState::Stopped => Duration::from_ticks(0),
            StopwatchState::Running { started_at } => now.saturating_duration_since(started_at),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, StopwatchState::Running { .. })
    }

    pub fn started_at(&self) -> Option<Instant> {
        match self.state {
            StopwatchState::Stopped => None,
            StopwatchState::Running { started_at } => Some(started_at),
        }
    }
}

/// `mm:ss` as shown on the stopwatch button.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
