//! Outbound application events.
//!
//! The [`RoastService`](super::service::RoastService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, web push, test recorder).

use embassy_time::Duration;

use crate::error::SensorError;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Periodic table snapshot.
    Table(TableRow),

    /// Auto mode switched on or off.
    ModeChanged { auto_mode: bool, target: Option<f64> },

    /// The PID set-point moved.
    TargetChanged(f64),

    /// A level was applied to the heater from a user command.
    HeatSet(u8),

    /// The probe failed; the control tick was skipped.
    SensorFault(SensorError),

    /// The logger refused a sample (running total attached).
    SampleDropped(u32),

    /// Stopwatch restarted and log cleared.
    SessionReset,

    /// A full chart redraw was produced with this many points.
    ChartRefreshed { points: usize },
}

/// The live-data table shown next to the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRow {
    pub elapsed: Duration,
    pub temperature: Option<f64>,
    pub heat_level: u8,
    pub rate_of_rise: f64,
    pub auto_mode: bool,
    pub target_rate_of_rise: Option<f64>,
    pub samples_logged: usize,
}
