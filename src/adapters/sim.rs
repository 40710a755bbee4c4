//! Simulated roaster adapter.
//!
//! Implements [`SensorPort`] and [`HeaterPort`] over a first-order thermal
//! model so the binary runs end to end on a host with no hardware:
//!
//! ```text
//!   dT/dt = gain · heat% − loss · (T − ambient)      (°C/s)
//! ```
//!
//! Probe faults can be injected to exercise the skip path.

use embassy_time::Instant;
use log::debug;

use crate::app::ports::{HeaterPort, SensorPort};
use crate::control::secs_f64;
use crate::error::SensorError;

/// Heating rate per percent of heater output (°C/s).
const DEFAULT_GAIN: f64 = 0.004;
/// Newtonian loss coefficient (1/s).
const DEFAULT_LOSS: f64 = 0.001;

pub struct SimulatedRoaster {
    temperature: f64,
    ambient: f64,
    heat_level: u8,
    gain: f64,
    loss: f64,
    last_read: Option<Instant>,
    faults_pending: u32,
    fault: SensorError,
}

impl SimulatedRoaster {
    /// Cold drum at `ambient` °C with the heater off.
    pub fn new(ambient: f64) -> Self {
        Self {
            temperature: ambient,
            ambient,
            heat_level: 0,
            gain: DEFAULT_GAIN,
            loss: DEFAULT_LOSS,
            last_read: None,
            faults_pending: 0,
            fault: SensorError::ReadFailed,
        }
    }

    /// Start from a preheated drum.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Integrate the model forward by `dt_secs`.
    pub fn advance(&mut self, dt_secs: f64) {
        if dt_secs <= 0.0 {
            return;
        }
        let rise = self.gain * f64::from(self.heat_level);
        let fall = self.loss * (self.temperature - self.ambient);
        self.temperature += (rise - fall) * dt_secs;
    }

    /// Fail the next `count` reads with `error`.
    pub fn inject_faults(&mut self, count: u32, error: SensorError) {
        self.faults_pending = count;
        self.fault = error;
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn heat_level(&self) -> u8 {
        self.heat_level
    }
}

impl SensorPort for SimulatedRoaster {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        let now = Instant::now();
        if let Some(last) = self.last_read {
            self.advance(secs_f64(now.saturating_duration_since(last)));
        }
        self.last_read = Some(now);

        if self.faults_pending > 0 {
            self.faults_pending -= 1;
            return Err(self.fault);
        }
        Ok(self.temperature)
    }
}

impl HeaterPort for SimulatedRoaster {
    fn drive_heater(&mut self, level: u8) {
        if level != self.heat_level {
            debug!("Sim: heater {}% -> {}%", self.heat_level, level);
        }
        self.heat_level = level;
    }
}
