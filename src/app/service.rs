//! Application service, the hexagonal core.
//!
//! [`RoastService`] owns the control loop (rate-of-rise estimator, PID
//! controller, heater driver), the roast session (log and stopwatch) and
//! the shared state store.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      RoastService      │
//!  HeaterPort ◀── │  RoR · PID · Log · UI  │
//!                 └────────────────────────┘
//! ```
//!
//! Every method takes `&self`: the four triggers and user commands may run
//! on different tasks or threads.  Each group of related state sits behind
//! its own blocking mutex, so multi-field updates (mode plus target, log
//! plus stopwatch) are never observed half-done.
//!
//! On the host every `CriticalSectionRawMutex` shares one process-wide
//! lock, so nothing slow runs while one is held: heater writes happen
//! after the control lock is released and chart figures are built from a
//! copy of the log.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};
use log::{debug, info, warn};

use crate::chart::{ChartFigure, ChartPoint, ChartSkip, ChartUpdate};
use crate::config::RoasterConfig;
use crate::control::pid::{PidController, PidGains};
use crate::control::ror::RateOfRiseEstimator;
use crate::datalog::{DataLogger, Field, Sample, Summary};
use crate::diagnostics::{Counter, Counters, RuntimeMetrics};
use crate::drivers::heater::HeaterDriver;
use crate::error::{ConfigError, SensorError};
use crate::state::{ControlState, ControlStore, StateKey, StateValue};
use crate::stopwatch::StopwatchTimer;

use super::commands::AppCommand;
use super::events::{AppEvent, TableRow};
use super::ports::{EventSink, HeaterPort, SensorPort, SkipReason, TickOutcome};

type Guarded<T> = Mutex<CriticalSectionRawMutex, RefCell<T>>;

// ───────────────────────────────────────────────────────────────
// Internal state groups
// ───────────────────────────────────────────────────────────────

/// Everything the control tick mutates.
struct ControlLoop {
    ror: RateOfRiseEstimator,
    pid: PidController,
    heater: HeaterDriver,
    auto_mode: bool,
    target: Option<f64>,
    temperature: Option<f64>,
}

impl ControlLoop {
    fn new(config: &RoasterConfig) -> Self {
        Self {
            ror: RateOfRiseEstimator::new(config.ror_window_samples),
            pid: PidController::from_config(config),
            heater: HeaterDriver::new(),
            auto_mode: false,
            target: None,
            temperature: None,
        }
    }

    fn state(&self) -> ControlState {
        ControlState {
            heat_level: self.heater.level(),
            temperature: self.temperature,
            rate_of_rise: self.ror.rate_of_rise(),
            auto_mode: self.auto_mode,
            target_rate_of_rise: self.target,
            pid_gains: self.pid.gains(),
        }
    }
}

/// The current roast: log and stopwatch reset together.
struct Session {
    log: DataLogger,
    stopwatch: StopwatchTimer,
}

impl Session {
    /// Zero of the time axis for charts and exports.
    fn origin(&self) -> Instant {
        self.stopwatch
            .started_at()
            .or_else(|| self.log.first().map(|s| s.timestamp))
            .unwrap_or(Instant::MIN)
    }
}

/// What a heat-slider command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatResponse {
    /// Manual mode: this level was applied to the heater.
    Applied(u8),
    /// Auto mode: the value became the new target rate-of-rise.
    Retargeted(f64),
}

// ───────────────────────────────────────────────────────────────
// RoastService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct RoastService {
    config: RoasterConfig,
    store: ControlStore,
    control: Guarded<ControlLoop>,
    session: Guarded<Session>,
    counters: Counters,
}

impl RoastService {
    /// Construct the service in manual mode with the heater off.
    ///
    /// The stopwatch is stopped until the first [`reset_stopwatch`](Self::reset_stopwatch).
    pub fn new(config: RoasterConfig, now: Instant) -> Self {
        let control = ControlLoop::new(&config);
        let store = ControlStore::new();
        store.publish(control.state().entries());
        info!(
            "RoastService: sample every {} ms, RoR window {} samples, gains {:?}",
            config.sample_interval_ms,
            control.ror.span(),
            control.pid.gains()
        );

        Self {
            control: Mutex::new(RefCell::new(control)),
            session: Mutex::new(RefCell::new(Session {
                log: DataLogger::new(),
                stopwatch: StopwatchTimer::new(),
            })),
            counters: Counters::new(now),
            store,
            config,
        }
    }

    // ── Control tick ──────────────────────────────────────────

    /// Run one control cycle: read probe → rate-of-rise → (auto) PID →
    /// heater → publish → log.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`HeaterPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.  A probe failure skips the whole tick:
    /// nothing is estimated, driven or logged.
    ///
    /// The level is latched and published under the control lock; the
    /// heater write follows once the lock is released.
    pub fn control_tick(
        &self,
        hw: &mut (impl SensorPort + HeaterPort),
        sink: &mut impl EventSink,
        now: Instant,
    ) -> TickOutcome {
        let temperature = match hw.read_temperature() {
            Ok(t) if t.is_finite() => t,
            Ok(t) => {
                warn!("Control: non-finite reading {}", t);
                return self.sensor_fault(SensorError::OutOfRange, sink);
            }
            Err(e) => return self.sensor_fault(e, sink),
        };

        let (sample, drive) = self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let rate = ctl.ror.update(now, temperature);
            ctl.temperature = Some(temperature);

            let drive = if ctl.auto_mode {
                let target = ctl.target.unwrap_or(self.config.default_target_ror);
                let output = ctl.pid.compute(target, rate, now);
                let level = ctl.heater.latch(output);
                debug!(
                    "Control: T={:.1} RoR={:.2} target={:.1} → heat {}%",
                    temperature, rate, target, level
                );
                Some(level)
            } else {
                None
            };

            self.store.publish(ctl.state().entries());
            let sample = Sample {
                timestamp: now,
                temperature,
                heat_level: ctl.heater.level(),
                auto_mode: ctl.auto_mode,
                rate_of_rise: rate,
            };
            (sample, drive)
        });
        if let Some(level) = drive {
            hw.drive_heater(level);
        }
        self.counters.bump(Counter::ControlTick);

        let (logged, dropped) = self.session.lock(|cell| {
            let mut session = cell.borrow_mut();
            let logged = session.log.append(sample);
            (logged, session.log.dropped())
        });
        if logged {
            self.counters.bump(Counter::SampleLogged);
        } else {
            self.counters.bump(Counter::SampleDropped);
            sink.emit(&AppEvent::SampleDropped(dropped));
        }

        TickOutcome::Completed
    }

    fn sensor_fault(&self, error: SensorError, sink: &mut impl EventSink) -> TickOutcome {
        let total = self.counters.bump(Counter::SensorFault);
        warn!("Control: {} ({} total), tick skipped", error, total);
        sink.emit(&AppEvent::SensorFault(error));
        TickOutcome::Skipped(SkipReason::Sensor(error))
    }

    // ── Chart ─────────────────────────────────────────────────

    /// Full redraw from the whole log.  Takes the chart lock for the
    /// configured TTL so chart-data ticks stand down meanwhile.
    pub fn refresh_chart(&self, now: Instant) -> ChartFigure {
        self.store.set_value(
            StateKey::ChartLock,
            StateValue::Flag(true),
            self.config.chart_lock_ttl(),
            now,
        );
        let (samples, origin) = self.session.lock(|cell| {
            let session = cell.borrow();
            (session.log.samples().to_vec(), session.origin())
        });
        let figure = ChartFigure::from_samples(&samples, origin);
        self.counters.bump(Counter::ChartRefresh);
        debug!("Chart: redraw with {} points", figure.len());
        figure
    }

    /// Points the figure has not seen yet.
    ///
    /// No-op while there is no figure, while the chart lock is held, when
    /// the figure was drawn for an earlier session, or when it already
    /// shows the newest sample.
    pub fn update_chart(&self, figure: Option<&ChartFigure>, now: Instant) -> ChartUpdate {
        let Some(figure) = figure else {
            return self.chart_skip(ChartSkip::NoFigure);
        };
        if self.store.is_locked(&StateKey::ChartLock, now) {
            return self.chart_skip(ChartSkip::Locked);
        }

        let fresh = self.session.lock(|cell| {
            let session = cell.borrow();
            (session.origin() == figure.origin())
                .then(|| session.log.since(figure.last_timestamp()).to_vec())
        });
        let Some(fresh) = fresh else {
            debug!("Chart: figure predates the current session");
            return self.chart_skip(ChartSkip::Stale);
        };
        let points: Vec<ChartPoint> = fresh
            .iter()
            .map(|s| ChartPoint::from_sample(s, figure.origin()))
            .collect();
        if points.is_empty() {
            return self.chart_skip(ChartSkip::NoNewData);
        }
        self.counters.bump(Counter::ChartUpdate);
        ChartUpdate::Extend(points)
    }

    fn chart_skip(&self, reason: ChartSkip) -> ChartUpdate {
        self.counters.bump(Counter::ChartSkip);
        ChartUpdate::NoUpdate(reason)
    }

    // ── Table / stopwatch ─────────────────────────────────────

    /// Current table row built from one coherent state snapshot.
    pub fn table(&self, now: Instant) -> TableRow {
        let state = ControlState::load(&self.store);
        let (elapsed, samples_logged) = self.session.lock(|cell| {
            let session = cell.borrow();
            (session.stopwatch.elapsed(now), session.log.len())
        });
        TableRow {
            elapsed,
            temperature: state.temperature,
            heat_level: state.heat_level,
            rate_of_rise: state.rate_of_rise,
            auto_mode: state.auto_mode,
            target_rate_of_rise: state.target_rate_of_rise,
            samples_logged,
        }
    }

    pub fn stopwatch(&self, now: Instant) -> Duration {
        self.session.lock(|cell| cell.borrow().stopwatch.elapsed(now))
    }

    /// Restart the stopwatch and clear the log in one step.  No other
    /// caller can observe one without the other.
    pub fn reset_stopwatch(&self, sink: &mut impl EventSink, now: Instant) {
        let cleared = self.session.lock(|cell| {
            let mut session = cell.borrow_mut();
            let cleared = session.log.len();
            session.log.reset();
            session.stopwatch.reset(now);
            cleared
        });
        self.counters.bump(Counter::SessionReset);
        info!("Session: stopwatch reset, {} samples cleared", cleared);
        sink.emit(&AppEvent::SessionReset);
    }

    // ── Heat / mode commands ──────────────────────────────────

    /// Heat slider.  In manual mode the level is clamped and applied to
    /// the heater, after the control lock is released.  In auto mode the
    /// value becomes the new target rate-of-rise instead.
    pub fn set_heat(
        &self,
        level: i32,
        hw: &mut impl HeaterPort,
        sink: &mut impl EventSink,
    ) -> HeatResponse {
        let response = self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let response = if ctl.auto_mode {
                let target = self.clamp_target(f64::from(level));
                ctl.target = Some(target);
                HeatResponse::Retargeted(target)
            } else {
                HeatResponse::Applied(ctl.heater.latch_manual(level))
            };
            self.store.publish(ctl.state().entries());
            response
        });
        if let HeatResponse::Applied(level) = response {
            hw.drive_heater(level);
        }

        match response {
            HeatResponse::Applied(level) => sink.emit(&AppEvent::HeatSet(level)),
            HeatResponse::Retargeted(target) => sink.emit(&AppEvent::TargetChanged(target)),
        }
        response
    }

    /// Enter auto mode tracking `target` (°C/min).  The controller's
    /// history is cleared on every manual → auto transition; calling this
    /// while already in auto mode only moves the target.
    pub fn start_pid(&self, target: f64, sink: &mut impl EventSink) -> f64 {
        let (target, entered) = self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let target = self.clamp_target(target);
            let entered = !ctl.auto_mode;
            if entered {
                ctl.pid.reset();
                ctl.auto_mode = true;
            }
            ctl.target = Some(target);
            self.store.publish(ctl.state().entries());
            (target, entered)
        });

        if entered {
            info!("PID: auto mode on, target {:.1} °C/min", target);
            sink.emit(&AppEvent::ModeChanged {
                auto_mode: true,
                target: Some(target),
            });
        } else {
            sink.emit(&AppEvent::TargetChanged(target));
        }
        target
    }

    /// Move the set-point without touching the controller's history.
    pub fn update_target(&self, target: f64, sink: &mut impl EventSink) -> f64 {
        let target = self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let target = self.clamp_target(target);
            ctl.target = Some(target);
            self.store.publish(ctl.state().entries());
            target
        });
        debug!("PID: target → {:.1} °C/min", target);
        sink.emit(&AppEvent::TargetChanged(target));
        target
    }

    /// Leave auto mode.  The heater holds its last level.  Returns whether
    /// auto mode was on.
    pub fn stop_pid(&self, sink: &mut impl EventSink) -> bool {
        let (was_auto, target) = self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let was_auto = ctl.auto_mode;
            ctl.auto_mode = false;
            self.store.publish(ctl.state().entries());
            (was_auto, ctl.target)
        });
        if was_auto {
            info!("PID: auto mode off");
            sink.emit(&AppEvent::ModeChanged {
                auto_mode: false,
                target,
            });
        }
        was_auto
    }

    /// Retune the controller.  Takes effect on the next control tick.
    pub fn update_gains(&self, gains: PidGains) -> Result<(), ConfigError> {
        if !gains.is_valid() {
            return Err(ConfigError::ValidationFailed("pid gains must be finite and >= 0"));
        }
        self.control.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            ctl.pid.set_gains(gains);
            self.store.publish(ctl.state().entries());
        });
        info!("PID: gains → {:?}", gains);
        Ok(())
    }

    fn clamp_target(&self, target: f64) -> f64 {
        if target.is_nan() {
            return self.config.default_target_ror;
        }
        target.clamp(0.0, self.config.max_target_ror)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (from the UI, serial, etc.).
    pub fn handle_command(
        &self,
        cmd: AppCommand,
        hw: &mut impl HeaterPort,
        sink: &mut impl EventSink,
        now: Instant,
    ) {
        match cmd {
            AppCommand::SetHeat(level) => {
                self.set_heat(level, hw, sink);
            }
            AppCommand::StartPid(target) => {
                self.start_pid(target, sink);
            }
            AppCommand::UpdateTarget(target) => {
                self.update_target(target, sink);
            }
            AppCommand::StopPid => {
                self.stop_pid(sink);
            }
            AppCommand::ResetStopwatch => self.reset_stopwatch(sink, now),
            AppCommand::UpdateGains(gains) => {
                if let Err(e) = self.update_gains(gains) {
                    warn!("Command rejected: {}", e);
                }
            }
        }
    }

    // ── Export ────────────────────────────────────────────────

    /// Requested columns over the whole log.  Accepts bare or `log.`
    /// prefixed names; unknown names are skipped.
    pub fn data_summary(&self, fields: &[&str]) -> Summary {
        let fields: Vec<Field> = fields
            .iter()
            .filter_map(|name| match name.parse::<Field>() {
                Ok(field) => Some(field),
                Err(e) => {
                    warn!("Export: {}, skipped", e);
                    None
                }
            })
            .collect();
        self.session.lock(|cell| {
            let session = cell.borrow();
            session.log.summary(&fields, session.origin())
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn get_value(&self, key: StateKey) -> Option<StateValue> {
        self.store.get_value(&key)
    }

    pub fn is_locked(&self, key: StateKey, now: Instant) -> bool {
        self.store.is_locked(&key, now)
    }

    /// Coherent snapshot of the published control state.
    pub fn control_state(&self) -> ControlState {
        ControlState::load(&self.store)
    }

    pub fn sample_count(&self) -> usize {
        self.session.lock(|cell| cell.borrow().log.len())
    }

    pub fn metrics(&self, now: Instant) -> RuntimeMetrics {
        self.counters.snapshot(now)
    }

    pub fn config(&self) -> &RoasterConfig {
        &self.config
    }
}
