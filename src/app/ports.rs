//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RoastService (domain)
//! ```
//!
//! Driven adapters (probe, heater, event sinks, config storage) implement
//! these traits.  [`RoastService`](super::service::RoastService) takes them
//! as generic arguments at each call, so the core never touches hardware
//! directly and every component can be tested with mocks.

use crate::chart::ChartSkip;
use crate::config::RoasterConfig;
use crate::error::{ConfigError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the control tick calls this once per firing.
pub trait SensorPort {
    /// Bean/drum temperature in °C.
    fn read_temperature(&mut self) -> Result<f64, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Heater port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port.  Fire-and-forget: no acknowledgement is expected.
pub trait HeaterPort {
    /// Drive the heater at `level` percent (always 0–100).
    fn drive_heater(&mut self, level: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / presentation)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`RoasterConfig`].
///
/// Implementations validate before persisting and reject out-of-range
/// values with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    fn load(&self) -> Result<RoasterConfig, ConfigError>;

    fn save(&self, config: &RoasterConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Tick delegate (decouples the scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// The four periodic triggers, each with its own cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// Sensor read → estimate → PID → heater → log.
    Control,
    /// Full chart redraw; installs the chart lock.
    ChartRefresh,
    /// Incremental chart points; skipped while the chart lock is held.
    ChartData,
    /// Table row and stopwatch readout.
    Table,
}

impl TickKind {
    pub const ALL: [TickKind; 4] = [
        TickKind::Control,
        TickKind::ChartRefresh,
        TickKind::ChartData,
        TickKind::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::ChartRefresh => "chart-refresh",
            Self::ChartData => "chart-data",
            Self::Table => "table",
        }
    }
}

/// Why a tick did nothing.  None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The probe failed; nothing was estimated or logged.
    Sensor(SensorError),
    /// The chart-data tick had nothing to add.
    Chart(ChartSkip),
}

/// What the scheduler learns from a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    Skipped(SkipReason),
}

/// Callback the scheduler invokes when a trigger fires.
pub trait TickDelegate {
    fn on_tick(&mut self, kind: TickKind, now: embassy_time::Instant) -> TickOutcome;
}
