//! PID controller for heater output
//!
//! Drives the heater level (0–100 %) so that the measured rate-of-rise
//! tracks the target rate-of-rise.  Integral is clamped to a symmetric
//! bound to prevent windup; dt is floored so the derivative never divides
//! by zero.

use embassy_time::Instant;
use serde::{Deserialize, Serialize};

use super::secs_f64;
use crate::config::RoasterConfig;

/// Lowest heater command the controller will emit.
pub const OUTPUT_MIN: f64 = 0.0;
/// Highest heater command the controller will emit.
pub const OUTPUT_MAX: f64 = 100.0;

/// Controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    /// Finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
    }
}

/// PID controller
pub struct PidController {
    gains: PidGains,
    integral_limit: f64,
    min_dt: f64,
    integral: f64,
    prev_error: f64,
    prev_time: Option<Instant>,
}

impl PidController {
    pub fn new(gains: PidGains, integral_limit: f64, min_dt: f64) -> Self {
        Self {
            gains,
            integral_limit,
            min_dt,
            integral: 0.0,
            prev_error: 0.0,
            prev_time: None,
        }
    }

    pub fn from_config(config: &RoasterConfig) -> Self {
        Self::new(config.pid, config.integral_limit, config.min_dt_secs)
    }

    /// Swap gains without touching accumulated state.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Compute the heater command for one control tick.
    ///
    /// The first call after construction or [`reset`](Self::reset) uses the
    /// dt floor and contributes no derivative term, since there is no
    /// previous error to difference against.
    pub fn compute(&mut self, target: f64, measured: f64, now: Instant) -> f64 {
        let error = target - measured;

        let (dt, first) = match self.prev_time {
            Some(prev) => (
                secs_f64(now.saturating_duration_since(prev)).max(self.min_dt),
                false,
            ),
            None => (self.min_dt, true),
        };

        // Integral (with anti-windup clamp)
        self.integral =
            (self.integral + error * dt).clamp(-self.integral_limit, self.integral_limit);

        // Derivative
        let derivative = if first {
            0.0
        } else {
            (error - self.prev_error) / dt
        };

        self.prev_error = error;
        self.prev_time = Some(now);

        let raw = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        if raw.is_nan() {
            return OUTPUT_MIN;
        }
        raw.clamp(OUTPUT_MIN, OUTPUT_MAX)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time = None;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }
}
