//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via the binary's subscriber).  A web or
//! websocket adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::stopwatch::format_elapsed;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Table(row) => {
                let temperature = row
                    .temperature
                    .map_or_else(|| "--".to_string(), |t| format!("{:.1}", t));
                let target = row
                    .target_rate_of_rise
                    .map_or_else(|| "--".to_string(), |t| format!("{:.1}", t));
                info!(
                    "TABLE | {} | T={}\u{00b0}C | RoR={:.1}\u{00b0}C/min | heat={}% | \
                     mode={} target={} | samples={}",
                    format_elapsed(row.elapsed),
                    temperature,
                    row.rate_of_rise,
                    row.heat_level,
                    if row.auto_mode { "AUTO" } else { "MANUAL" },
                    target,
                    row.samples_logged,
                );
            }
            AppEvent::ModeChanged { auto_mode, target } => {
                info!(
                    "MODE | {} target={:?}",
                    if *auto_mode { "AUTO" } else { "MANUAL" },
                    target
                );
            }
            AppEvent::TargetChanged(target) => {
                info!("MODE | target -> {:.1}\u{00b0}C/min", target);
            }
            AppEvent::HeatSet(level) => {
                info!("HEAT | manual {}%", level);
            }
            AppEvent::SensorFault(e) => {
                warn!("FAULT | {}", e);
            }
            AppEvent::SampleDropped(total) => {
                warn!("FAULT | sample dropped, {} total", total);
            }
            AppEvent::SessionReset => {
                info!("SESSION | stopwatch reset, log cleared");
            }
            AppEvent::ChartRefreshed { points } => {
                info!("CHART | redraw, {} points", points);
            }
        }
    }
}
