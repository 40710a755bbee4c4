//! Heater element driver.
//!
//! Every level that reaches the heater, whether from the PID loop or the
//! heat slider, passes through [`HeaterDriver::latch`], which clamps it to
//! 0–100 %.  Out-of-range requests are clamped, never rejected.
//!
//! ## Dual-target design
//!
//! The driver talks to a [`HeaterPort`].  On a board that port is a
//! [`PwmHeater`] wrapping any `embedded-hal` PWM channel; on host/test it
//! is a simulator or a mock.

use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::app::ports::HeaterPort;

pub const LEVEL_MIN: u8 = 0;
pub const LEVEL_MAX: u8 = 100;

/// Clamp an arbitrary request to a heater level.  NaN maps to 0.
pub fn clamp_level(level: f64) -> u8 {
    if level.is_nan() {
        return LEVEL_MIN;
    }
    level
        .round()
        .clamp(f64::from(LEVEL_MIN), f64::from(LEVEL_MAX)) as u8
}

/// Tracks the level last forwarded to the heater.
#[derive(Debug, Default)]
pub struct HeaterDriver {
    level: u8,
}

impl HeaterDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp, store and forward `level`.  Returns the stored value.
    pub fn apply(&mut self, level: f64, port: &mut impl HeaterPort) -> u8 {
        let level = self.latch(level);
        port.drive_heater(level);
        level
    }

    /// User-driven path from the heat slider.
    pub fn set_manual(&mut self, level: i32, port: &mut impl HeaterPort) -> u8 {
        let applied = self.latch_manual(level);
        port.drive_heater(applied);
        applied
    }

    /// Clamp and store `level` without touching the heater.  The caller
    /// forwards the returned value once it has released its locks.
    pub fn latch(&mut self, level: f64) -> u8 {
        self.level = clamp_level(level);
        self.level
    }

    /// [`latch`](Self::latch) for a slider value.
    pub fn latch_manual(&mut self, level: i32) -> u8 {
        let applied = self.latch(f64::from(level));
        if i32::from(applied) != level {
            info!("Heater: manual level {} clamped to {}", level, applied);
        }
        applied
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

// ───────────────────────────────────────────────────────────────
// PWM-backed heater
// ───────────────────────────────────────────────────────────────

/// Solid-state relay or triac gate driven from a PWM channel.
pub struct PwmHeater<P> {
    pwm: P,
    faults: u32,
}

impl<P: SetDutyCycle> PwmHeater<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, faults: 0 }
    }

    /// PWM writes that failed since startup.
    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> HeaterPort for PwmHeater<P> {
    fn drive_heater(&mut self, level: u8) {
        if let Err(e) = self.pwm.set_duty_cycle_percent(level.min(LEVEL_MAX)) {
            self.faults = self.faults.saturating_add(1);
            warn!("Heater: PWM write failed: {:?}", e);
        }
    }
}
