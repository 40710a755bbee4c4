//! Append-only roast log.
//!
//! One [`Sample`] per successful control tick, in timestamp order, kept for
//! the current roast session only.  Malformed samples are dropped and
//! counted rather than reported to the caller so the sampling loop never
//! stalls on a bad reading.

use core::fmt;
use core::str::FromStr;
use std::io;

use embassy_time::Instant;
use log::warn;
use serde::Serialize;

use crate::control::secs_f64;
use crate::error::SampleError;

/// One logged control-tick result.  Immutable once logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Instant,
    /// Probe reading (°C).
    pub temperature: f64,
    /// Heater level applied on this tick (0–100).
    pub heat_level: u8,
    pub auto_mode: bool,
    /// Rate-of-rise (°C/min).
    pub rate_of_rise: f64,
}

impl Sample {
    fn check(&self, last: Option<&Sample>) -> Result<(), SampleError> {
        if !self.temperature.is_finite() || !self.rate_of_rise.is_finite() {
            return Err(SampleError::NotFinite);
        }
        if self.temperature < 0.0 {
            return Err(SampleError::NegativeTemperature);
        }
        if last.is_some_and(|prev| self.timestamp < prev.timestamp) {
            return Err(SampleError::OutOfOrder);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Export fields
// ───────────────────────────────────────────────────────────────

/// Columns available for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    Heat,
    AutoMode,
    RateOfRise,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Temperature,
        Field::Heat,
        Field::AutoMode,
        Field::RateOfRise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Heat => "heat",
            Self::AutoMode => "auto_mode",
            Self::RateOfRise => "rate_of_rise",
        }
    }

    fn extract(self, sample: &Sample) -> FieldValue {
        match self {
            Self::Temperature => FieldValue::Number(sample.temperature),
            Self::Heat => FieldValue::Level(sample.heat_level),
            Self::AutoMode => FieldValue::Flag(sample.auto_mode),
            Self::RateOfRise => FieldValue::Number(sample.rate_of_rise),
        }
    }
}

/// Unrecognised export field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    /// Accepts bare names and the `log.` prefixed form (`log.temperature`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("log.").unwrap_or(name);
        match name {
            "temperature" | "temp" => Ok(Self::Temperature),
            "heat" | "heat_level" => Ok(Self::Heat),
            "auto_mode" | "auto" => Ok(Self::AutoMode),
            "rate_of_rise" | "ror" => Ok(Self::RateOfRise),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Level(u8),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Level(v) => write!(f, "{}", v),
            Self::Flag(v) => write!(f, "{}", v),
        }
    }
}

/// One exported row: seconds since the export origin plus the requested
/// columns in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub time_secs: f64,
    pub values: Vec<FieldValue>,
}

/// Filtered export of the whole log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub fields: Vec<Field>,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    /// Header line then one line per sample; time is the first column.
    pub fn write_csv(&self, w: &mut impl io::Write) -> io::Result<()> {
        write!(w, "time")?;
        for field in &self.fields {
            write!(w, ",{}", field.name())?;
        }
        writeln!(w)?;
        for row in &self.rows {
            write!(w, "{:.3}", row.time_secs)?;
            for value in &row.values {
                write!(w, ",{}", value)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// DataLogger
// ───────────────────────────────────────────────────────────────

/// Append-only, timestamp-ordered sample log.
#[derive(Debug, Default)]
pub struct DataLogger {
    samples: Vec<Sample>,
    dropped: u32,
}

impl DataLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `sample`.  Returns `false` (and counts a drop) if it is
    /// malformed; never panics or propagates.
    pub fn append(&mut self, sample: Sample) -> bool {
        match sample.check(self.samples.last()) {
            Ok(()) => {
                self.samples.push(sample);
                true
            }
            Err(e) => {
                self.dropped = self.dropped.saturating_add(1);
                warn!("DataLog: sample dropped ({}), {} total", e, self.dropped);
                false
            }
        }
    }

    /// Requested columns across every sample, in log order.
    pub fn summary(&self, fields: &[Field], origin: Instant) -> Summary {
        let rows = self
            .samples
            .iter()
            .map(|s| SummaryRow {
                time_secs: secs_f64(s.timestamp.saturating_duration_since(origin)),
                values: fields.iter().map(|f| f.extract(s)).collect(),
            })
            .collect();
        Summary {
            fields: fields.to_vec(),
            rows,
        }
    }

    /// Every sample strictly newer than `after` (all samples when `None`).
    pub fn since(&self, after: Option<Instant>) -> &[Sample] {
        match after {
            None => &self.samples,
            Some(t) => {
                let start = self.samples.partition_point(|s| s.timestamp <= t);
                &self.samples[start..]
            }
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Malformed samples rejected since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Clear the log.  The drop counter is a lifetime diagnostic and is kept.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
