//! Periodic trigger engine.
//!
//! Four independent triggers drive the roaster.  Each one notifies a
//! [`TickDelegate`] when it comes due; the delegate decides what the tick
//! does.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Periodic Triggers                        │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Control   │  │ Chart     │  │ Chart     │  │ Table    │   │
//! │  │ (sample)  │  │ refresh   │  │ data      │  │          │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │              │              │              │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                   TickDelegate                         │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                    RoastService                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A trigger that falls behind skips the periods it missed instead of
//! queueing them, so a slow tick never causes a burst of catch-up ticks.

use embassy_time::{Duration, Instant};
use log::{debug, info};

use crate::app::ports::{TickDelegate, TickKind, TickOutcome};
use crate::config::RoasterConfig;

/// Shortest accepted interval; guards against a zero period spinning.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ═══════════════════════════════════════════════════════════════
//  PeriodicTrigger
// ═══════════════════════════════════════════════════════════════

/// One fixed-cadence trigger.
#[derive(Debug, Clone)]
pub struct PeriodicTrigger {
    kind: TickKind,
    interval: Duration,
    next_due: Instant,
    enabled: bool,
    completed: u64,
    skipped: u64,
    missed: u64,
}

impl PeriodicTrigger {
    /// First firing is due at `start`.
    pub fn new(kind: TickKind, interval: Duration, start: Instant) -> Self {
        Self {
            kind,
            interval: interval.max(MIN_INTERVAL),
            next_due: start,
            enabled: true,
            completed: 0,
            skipped: 0,
            missed: 0,
        }
    }

    pub fn kind(&self) -> TickKind {
        self.kind
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.enabled && now >= self.next_due
    }

    /// Consume the current period if it is due.  Returns whether the
    /// trigger fired.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.advance(now);
        true
    }

    fn advance(&mut self, now: Instant) {
        let next = add(self.next_due, self.interval);
        if next <= now {
            let behind = now.saturating_duration_since(self.next_due);
            let periods = behind.as_ticks() / self.interval.as_ticks().max(1);
            self.missed = self.missed.saturating_add(periods);
            debug!(
                "Scheduler: '{}' skipped {} missed period(s)",
                self.kind.label(),
                periods
            );
            self.next_due = add(now, self.interval);
        } else {
            self.next_due = next;
        }
    }

    /// Record what the delegate did with the last firing.
    pub fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Completed => self.completed = self.completed.saturating_add(1),
            TickOutcome::Skipped(_) => self.skipped = self.skipped.saturating_add(1),
        }
    }

    /// Change the cadence.  Takes effect from the next due time.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_INTERVAL);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Periods dropped because the trigger was serviced late.
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

fn add(at: Instant, d: Duration) -> Instant {
    at.checked_add(d).unwrap_or(Instant::MAX)
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The four roaster triggers in a fixed array.
///
/// Decoupled from the service: firings go to the [`TickDelegate`], which
/// keeps the scheduler testable with a recording delegate.
pub struct Scheduler {
    triggers: [PeriodicTrigger; 4],
    enabled: bool,
}

impl Scheduler {
    /// Triggers at the configured cadences, all first due at `start`.
    pub fn from_config(config: &RoasterConfig, start: Instant) -> Self {
        let triggers = TickKind::ALL.map(|kind| {
            let interval = match kind {
                TickKind::Control => config.sample_interval(),
                TickKind::ChartRefresh => config.chart_refresh_interval(),
                TickKind::ChartData => config.chart_data_interval(),
                TickKind::Table => config.table_interval(),
            };
            info!(
                "Scheduler: '{}' every {} ms",
                kind.label(),
                interval.as_millis()
            );
            PeriodicTrigger::new(kind, interval, start)
        });
        Self {
            triggers,
            enabled: true,
        }
    }

    /// Fire every due trigger in slot order.  Returns how many fired.
    pub fn poll(&mut self, now: Instant, delegate: &mut dyn TickDelegate) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut fired = 0;
        for trigger in self.triggers.iter_mut() {
            if trigger.fire(now) {
                let outcome = delegate.on_tick(trigger.kind(), now);
                if let TickOutcome::Skipped(reason) = outcome {
                    debug!("Scheduler: '{}' skipped ({:?})", trigger.kind().label(), reason);
                }
                trigger.record(outcome);
                fired += 1;
            }
        }
        fired
    }

    /// Earliest instant at which any enabled trigger is due.
    pub fn next_due(&self) -> Option<Instant> {
        self.triggers
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.next_due())
            .min()
    }

    pub fn trigger(&self, kind: TickKind) -> &PeriodicTrigger {
        &self.triggers[slot(kind)]
    }

    pub fn set_interval(&mut self, kind: TickKind, interval: Duration) {
        info!(
            "Scheduler: '{}' interval → {} ms",
            kind.label(),
            interval.as_millis()
        );
        self.triggers[slot(kind)].set_interval(interval);
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Hand the triggers out for independent drivers (one task each).
    pub fn into_triggers(self) -> [PeriodicTrigger; 4] {
        self.triggers
    }
}

fn slot(kind: TickKind) -> usize {
    match kind {
        TickKind::Control => 0,
        TickKind::ChartRefresh => 1,
        TickKind::ChartData => 2,
        TickKind::Table => 3,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
