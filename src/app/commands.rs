//! Inbound commands to the application service.
//!
//! These are the user actions the presentation layer forwards (heat
//! slider, rate-of-rise slider, stopwatch button).  Every argument is
//! clamped by the service, never rejected.

use crate::control::pid::PidGains;

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Heat slider moved.  Direct heater level in manual mode, new target
    /// rate-of-rise in auto mode.
    SetHeat(i32),

    /// Enter auto mode tracking the given rate-of-rise (°C/min).
    StartPid(f64),

    /// Adjust the target rate-of-rise without restarting the controller.
    UpdateTarget(f64),

    /// Leave auto mode; the heater holds its last level.
    StopPid,

    /// Restart the stopwatch and clear the roast log together.
    ResetStopwatch,

    /// Retune the controller.
    UpdateGains(PidGains),
}
