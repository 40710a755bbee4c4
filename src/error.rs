//! Error taxonomy for the roaster control core.
//!
//! Every variant is `Copy` so it can be carried through events and
//! counters without allocation.  None of these ever unwinds across a tick
//! boundary: the component that detects a failure contains it and the
//! scheduler only ever sees "completed" or "skipped".

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Failure reading the bean/drum temperature probe.  Always transient:
/// the control tick skips and the next scheduled firing retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The probe did not answer (bus error, timeout).
    ReadFailed,
    /// Thermocouple open circuit or probe unplugged.
    Disconnected,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "probe read failed"),
            Self::Disconnected => write!(f, "probe disconnected"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample errors
// ---------------------------------------------------------------------------

/// Why the data logger refused a sample.  Counted, never surfaced per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// Temperature below zero.
    NegativeTemperature,
    /// Temperature or rate-of-rise is NaN or infinite.
    NotFinite,
    /// Timestamp is older than the last logged sample.
    OutOfOrder,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeTemperature => write!(f, "negative temperature"),
            Self::NotFinite => write!(f, "non-finite value"),
            Self::OutOfOrder => write!(f, "timestamp older than last sample"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from loading, validating or persisting [`RoasterConfig`](crate::config::RoasterConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No stored config (first run).
    NotFound,
    /// Stored config failed to parse.
    Corrupted,
    /// A field failed range validation; the message names the field.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing store.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for SensorError {}
impl std::error::Error for SampleError {}
impl std::error::Error for ConfigError {}
