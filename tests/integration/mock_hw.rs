//! Mock hardware adapter for integration tests.
//!
//! Replays a scripted sequence of probe readings and records every heater
//! call so tests can assert on the full command history without a drum.

use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use roastctl::app::events::AppEvent;
use roastctl::app::ports::{EventSink, HeaterPort, SensorPort};
use roastctl::error::SensorError;

// ── MockRoaster ───────────────────────────────────────────────

pub struct MockRoaster {
    readings: VecDeque<Result<f64, SensorError>>,
    /// Returned once the script runs out.
    fallback: Result<f64, SensorError>,
    pub heater_calls: Vec<u8>,
}

#[allow(dead_code)]
impl MockRoaster {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            fallback: Ok(20.0),
            heater_calls: Vec::new(),
        }
    }

    pub fn with_readings(readings: impl IntoIterator<Item = f64>) -> Self {
        let mut hw = Self::new();
        for r in readings {
            hw.push_reading(r);
        }
        hw
    }

    pub fn push_reading(&mut self, temperature: f64) {
        self.readings.push_back(Ok(temperature));
        self.fallback = Ok(temperature);
    }

    pub fn push_fault(&mut self, error: SensorError) {
        self.readings.push_back(Err(error));
    }

    pub fn last_heat(&self) -> Option<u8> {
        self.heater_calls.last().copied()
    }
}

impl Default for MockRoaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockRoaster {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        self.readings.pop_front().unwrap_or(self.fallback)
    }
}

impl HeaterPort for MockRoaster {
    fn drive_heater(&mut self, level: u8) {
        self.heater_calls.push(level);
    }
}

// ── SlowRoaster ───────────────────────────────────────────────

/// Fixed probe reading and a heater write that takes `delay`.  Announces
/// each write on `entered` before it starts waiting.
pub struct SlowRoaster {
    temperature: f64,
    delay: Duration,
    entered: Sender<u8>,
    pub heater_calls: Vec<u8>,
}

#[allow(dead_code)]
impl SlowRoaster {
    pub fn new(temperature: f64, delay: Duration, entered: Sender<u8>) -> Self {
        Self {
            temperature,
            delay,
            entered,
            heater_calls: Vec::new(),
        }
    }
}

impl SensorPort for SlowRoaster {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        Ok(self.temperature)
    }
}

impl HeaterPort for SlowRoaster {
    fn drive_heater(&mut self, level: u8) {
        let _ = self.entered.send(level);
        thread::sleep(self.delay);
        self.heater_calls.push(level);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
