//! Runtime diagnostics.
//!
//! Lock-free counters bumped from the tick paths, plus a [`RuntimeMetrics`]
//! snapshot for logging or export.  Counters are monotonic for the life of
//! the process; a stopwatch reset does not clear them.

use core::sync::atomic::{AtomicU64, Ordering};

use embassy_time::{Duration, Instant};
use serde::{Deserialize, Serialize};

/// Snapshot of the counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub control_ticks: u64,
    pub sensor_faults: u64,
    pub samples_logged: u64,
    pub samples_dropped: u64,
    pub chart_refreshes: u64,
    pub chart_updates: u64,
    pub chart_skips: u64,
    pub session_resets: u64,
}

/// Atomic counters shared by every tick.
pub struct Counters {
    started_at: Instant,
    control_ticks: AtomicU64,
    sensor_faults: AtomicU64,
    samples_logged: AtomicU64,
    samples_dropped: AtomicU64,
    chart_refreshes: AtomicU64,
    chart_updates: AtomicU64,
    chart_skips: AtomicU64,
    session_resets: AtomicU64,
}

/// Which counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    ControlTick,
    SensorFault,
    SampleLogged,
    SampleDropped,
    ChartRefresh,
    ChartUpdate,
    ChartSkip,
    SessionReset,
}

impl Counters {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            control_ticks: AtomicU64::new(0),
            sensor_faults: AtomicU64::new(0),
            samples_logged: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            chart_refreshes: AtomicU64::new(0),
            chart_updates: AtomicU64::new(0),
            chart_skips: AtomicU64::new(0),
            session_resets: AtomicU64::new(0),
        }
    }

    fn cell(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::ControlTick => &self.control_ticks,
            Counter::SensorFault => &self.sensor_faults,
            Counter::SampleLogged => &self.samples_logged,
            Counter::SampleDropped => &self.samples_dropped,
            Counter::ChartRefresh => &self.chart_refreshes,
            Counter::ChartUpdate => &self.chart_updates,
            Counter::ChartSkip => &self.chart_skips,
            Counter::SessionReset => &self.session_resets,
        }
    }

    pub fn bump(&self, counter: Counter) -> u64 {
        self.cell(counter).fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.cell(counter).load(Ordering::Relaxed)
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn snapshot(&self, now: Instant) -> RuntimeMetrics {
        RuntimeMetrics {
            uptime_secs: self.uptime(now).as_secs(),
            control_ticks: self.get(Counter::ControlTick),
            sensor_faults: self.get(Counter::SensorFault),
            samples_logged: self.get(Counter::SampleLogged),
            samples_dropped: self.get(Counter::SampleDropped),
            chart_refreshes: self.get(Counter::ChartRefresh),
            chart_updates: self.get(Counter::ChartUpdate),
            chart_skips: self.get(Counter::ChartSkip),
            session_resets: self.get(Counter::SessionReset),
        }
    }
}
