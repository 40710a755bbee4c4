//! Closed-loop control: rate-of-rise estimation and the heater PID.

pub mod pid;
pub mod ror;

use embassy_time::Duration;

/// Fractional seconds, for the floating-point control maths.
pub(crate) fn secs_f64(d: Duration) -> f64 {
    d.as_micros() as f64 / 1_000_000.0
}
