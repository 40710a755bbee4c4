//! Tick delegate that binds the scheduler to the service.
//!
//! Owns the hardware adapter, the event sink and the figure the
//! presentation layer currently shows, and turns each trigger firing into
//! the matching [`RoastService`] call.

use embassy_time::Instant;
use log::debug;

use crate::chart::{ChartFigure, ChartSkip, ChartUpdate};

use super::commands::AppCommand;
use super::events::{AppEvent, TableRow};
use super::ports::{EventSink, HeaterPort, SensorPort, SkipReason, TickDelegate, TickKind, TickOutcome};
use super::service::RoastService;

pub struct TickRunner<'a, H, S> {
    service: &'a RoastService,
    hw: H,
    sink: S,
    figure: Option<ChartFigure>,
    last_row: Option<TableRow>,
}

impl<'a, H, S> TickRunner<'a, H, S>
where
    H: SensorPort + HeaterPort,
    S: EventSink,
{
    pub fn new(service: &'a RoastService, hw: H, sink: S) -> Self {
        Self {
            service,
            hw,
            sink,
            figure: None,
            last_row: None,
        }
    }

    /// Forward a user command using this runner's heater and sink.
    pub fn command(&mut self, cmd: AppCommand, now: Instant) {
        self.service
            .handle_command(cmd, &mut self.hw, &mut self.sink, now);
    }

    /// The figure as last drawn and extended.
    pub fn figure(&self) -> Option<&ChartFigure> {
        self.figure.as_ref()
    }

    pub fn last_row(&self) -> Option<&TableRow> {
        self.last_row.as_ref()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn redraw(&mut self, now: Instant) {
        let figure = self.service.refresh_chart(now);
        self.sink.emit(&AppEvent::ChartRefreshed {
            points: figure.len(),
        });
        self.figure = Some(figure);
    }

    /// A figure from an earlier session is redrawn at once instead of
    /// waiting for the next chart-refresh tick.
    fn chart_data(&mut self, now: Instant) -> TickOutcome {
        let update = self.service.update_chart(self.figure.as_ref(), now);
        if update == ChartUpdate::NoUpdate(ChartSkip::Stale) {
            self.redraw(now);
            return TickOutcome::Completed;
        }
        match (&update, self.figure.as_mut()) {
            (ChartUpdate::Extend(_), Some(figure)) => {
                let added = figure.apply(&update);
                debug!("Chart: +{} points ({} total)", added, figure.len());
                TickOutcome::Completed
            }
            (ChartUpdate::NoUpdate(skip), _) => TickOutcome::Skipped(SkipReason::Chart(*skip)),
            (ChartUpdate::Extend(_), None) => TickOutcome::Completed,
        }
    }
}

impl<H, S> TickDelegate for TickRunner<'_, H, S>
where
    H: SensorPort + HeaterPort,
    S: EventSink,
{
    fn on_tick(&mut self, kind: TickKind, now: Instant) -> TickOutcome {
        match kind {
            TickKind::Control => self.service.control_tick(&mut self.hw, &mut self.sink, now),
            TickKind::ChartRefresh => {
                self.redraw(now);
                TickOutcome::Completed
            }
            TickKind::ChartData => self.chart_data(now),
            TickKind::Table => {
                let row = self.service.table(now);
                self.sink.emit(&AppEvent::Table(row));
                self.last_row = Some(row);
                TickOutcome::Completed
            }
        }
    }
}
