//! Roaster configuration parameters
//!
//! All tunable parameters for the control core.  PID gains and the target
//! rate-of-rise are operational tuning, so they live here with documented
//! defaults instead of being hard-coded in the controller.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::control::pid::PidGains;
use crate::control::ror::MAX_ROR_WINDOW;
use crate::error::ConfigError;

/// Core roaster configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoasterConfig {
    // --- Timing ---
    /// Control tick interval: sensor read, estimate, PID, heater (milliseconds)
    pub sample_interval_ms: u32,
    /// Table / stopwatch tick interval (milliseconds)
    pub table_interval_ms: u32,
    /// Chart-data tick interval (milliseconds)
    pub chart_data_interval_ms: u32,
    /// Full chart redraw interval (milliseconds)
    pub chart_refresh_interval_ms: u32,
    /// How long a chart redraw suppresses chart-data ticks (milliseconds)
    pub chart_lock_ttl_ms: u32,

    // --- Rate of rise ---
    /// Samples in the rate-of-rise window (2..=MAX_ROR_WINDOW)
    pub ror_window_samples: usize,

    // --- PID ---
    /// Controller gains
    pub pid: PidGains,
    /// Integral accumulator bound (symmetric), prevents windup
    pub integral_limit: f64,
    /// Floor applied to dt so the derivative never divides by zero (seconds)
    pub min_dt_secs: f64,

    // --- Set-points ---
    /// Target rate-of-rise used when auto mode starts without one (°C/min)
    pub default_target_ror: f64,
    /// Upper bound for user-supplied target rate-of-rise (°C/min)
    pub max_target_ror: f64,
}

impl Default for RoasterConfig {
    fn default() -> Self {
        Self {
            // Timing
            sample_interval_ms: 1000,         // 1 Hz
            table_interval_ms: 1000,          // 1 Hz
            chart_data_interval_ms: 2000,     // 2x baseline
            chart_refresh_interval_ms: 60_000, // 1/min
            chart_lock_ttl_ms: 5000,

            // Rate of rise
            ror_window_samples: 6,

            // PID
            pid: PidGains {
                kp: 4.0,
                ki: 0.2,
                kd: 1.0,
            },
            integral_limit: 500.0,
            min_dt_secs: 0.1,

            // Set-points
            default_target_ror: 10.0,
            max_target_ror: 60.0,
        }
    }
}

impl RoasterConfig {
    /// Reject values that would stall a trigger or destabilise the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_interval_ms must be > 0"));
        }
        if self.table_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("table_interval_ms must be > 0"));
        }
        if self.chart_data_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("chart_data_interval_ms must be > 0"));
        }
        if self.chart_refresh_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "chart_refresh_interval_ms must be > 0",
            ));
        }
        if !(2..=MAX_ROR_WINDOW).contains(&self.ror_window_samples) {
            return Err(ConfigError::ValidationFailed(
                "ror_window_samples out of range",
            ));
        }
        if !self.pid.is_valid() {
            return Err(ConfigError::ValidationFailed("pid gains must be finite and >= 0"));
        }
        if !(self.integral_limit.is_finite() && self.integral_limit > 0.0) {
            return Err(ConfigError::ValidationFailed("integral_limit must be > 0"));
        }
        if !(self.min_dt_secs.is_finite() && self.min_dt_secs > 0.0) {
            return Err(ConfigError::ValidationFailed("min_dt_secs must be > 0"));
        }
        if !(self.max_target_ror.is_finite() && self.max_target_ror > 0.0) {
            return Err(ConfigError::ValidationFailed("max_target_ror must be > 0"));
        }
        if !(0.0..=self.max_target_ror).contains(&self.default_target_ror) {
            return Err(ConfigError::ValidationFailed(
                "default_target_ror outside 0..=max_target_ror",
            ));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.sample_interval_ms))
    }

    pub fn table_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.table_interval_ms))
    }

    pub fn chart_data_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.chart_data_interval_ms))
    }

    pub fn chart_refresh_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.chart_refresh_interval_ms))
    }

    pub fn chart_lock_ttl(&self) -> Duration {
        Duration::from_millis(u64::from(self.chart_lock_ttl_ms))
    }
}
