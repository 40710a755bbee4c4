//! Chart series handed to the presentation layer.
//!
//! A full redraw builds a fresh [`ChartFigure`] from the whole log; between
//! redraws the chart-data tick returns only the points the figure has not
//! seen yet, or an explicit [`ChartUpdate::NoUpdate`].

use embassy_time::Instant;

use crate::control::secs_f64;
use crate::datalog::Sample;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub timestamp: Instant,
    /// Seconds since the figure's origin (x axis).
    pub time_secs: f64,
    pub temperature: f64,
    pub heat_level: u8,
    pub rate_of_rise: f64,
}

impl ChartPoint {
    pub fn from_sample(sample: &Sample, origin: Instant) -> Self {
        Self {
            timestamp: sample.timestamp,
            time_secs: secs_f64(sample.timestamp.saturating_duration_since(origin)),
            temperature: sample.temperature,
            heat_level: sample.heat_level,
            rate_of_rise: sample.rate_of_rise,
        }
    }
}

/// Why a chart-data tick produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSkip {
    /// The presentation layer has no figure yet.
    NoFigure,
    /// A full redraw holds the chart lock.
    Locked,
    /// The figure already shows the newest sample.
    NoNewData,
    /// The figure was drawn before the last stopwatch reset.
    Stale,
}

/// Result of a chart-data tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartUpdate {
    /// Points to append, oldest first.
    Extend(Vec<ChartPoint>),
    NoUpdate(ChartSkip),
}

/// The figure as currently drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFigure {
    origin: Instant,
    points: Vec<ChartPoint>,
}

impl ChartFigure {
    /// Full figure from every sample in the log.
    pub fn from_samples(samples: &[Sample], origin: Instant) -> Self {
        Self {
            origin,
            points: samples
                .iter()
                .map(|s| ChartPoint::from_sample(s, origin))
                .collect(),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    /// Timestamp of the newest plotted point.
    pub fn last_timestamp(&self) -> Option<Instant> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Apply an update; returns the number of points appended.
    pub fn apply(&mut self, update: &ChartUpdate) -> usize {
        match update {
            ChartUpdate::Extend(points) => {
                self.points.extend_from_slice(points);
                points.len()
            }
            ChartUpdate::NoUpdate(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
