//! End-to-end: scheduler → tick runner → service, driven with explicit
//! instants.

use embassy_time::Instant;

use roastctl::app::commands::AppCommand;
use roastctl::app::events::AppEvent;
use roastctl::app::ports::{TickDelegate, TickKind, TickOutcome};
use roastctl::app::runner::TickRunner;
use roastctl::app::service::RoastService;
use roastctl::config::RoasterConfig;
use roastctl::scheduler::Scheduler;

use crate::mock_hw::{MockRoaster, RecordingSink};

fn at(secs: u64) -> Instant {
    Instant::from_secs(secs)
}

#[test]
fn twelve_seconds_of_ticks() {
    let config = RoasterConfig::default();
    let app = RoastService::new(config.clone(), at(0));
    let hw = MockRoaster::with_readings((0..=12).map(|i| 150.0 + f64::from(i)));
    let mut runner = TickRunner::new(&app, hw, RecordingSink::new());
    let mut sched = Scheduler::from_config(&config, at(0));

    for secs in 0..=12 {
        sched.poll(at(secs), &mut runner);
    }

    assert_eq!(app.sample_count(), 13);

    // Chart data at 0, 2, 4 fell inside the 5 s lock taken at 0.
    let data = sched.trigger(TickKind::ChartData);
    assert_eq!(data.skipped(), 3);
    assert_eq!(data.completed(), 4);
    assert_eq!(runner.figure().map(|f| f.len()), Some(13));

    let tables = runner
        .sink()
        .count(|e| matches!(e, AppEvent::Table(_)));
    assert_eq!(tables, 13);
    let row = runner.last_row().unwrap();
    assert_eq!(row.temperature, Some(162.0));
    assert!((row.rate_of_rise - 60.0).abs() < 1e-9);
}

#[test]
fn commands_reach_the_heater() {
    let config = RoasterConfig::default();
    let app = RoastService::new(config.clone(), at(0));
    let mut runner = TickRunner::new(&app, MockRoaster::new(), RecordingSink::new());

    runner.command(AppCommand::SetHeat(55), at(0));
    runner.command(AppCommand::StartPid(8.0), at(1));
    runner.command(AppCommand::SetHeat(12), at(2));

    assert_eq!(runner.hardware().heater_calls, vec![55]);
    let state = app.control_state();
    assert!(state.auto_mode);
    assert_eq!(state.target_rate_of_rise, Some(12.0));
}

#[test]
fn auto_mode_reaches_heater_through_scheduler() {
    let config = RoasterConfig::default();
    let app = RoastService::new(config.clone(), at(0));
    let mut runner = TickRunner::new(&app, MockRoaster::with_readings([150.0]), RecordingSink::new());
    let mut sched = Scheduler::from_config(&config, at(0));

    runner.command(AppCommand::StartPid(10.0), at(0));
    for secs in 0..3 {
        sched.poll(at(secs), &mut runner);
    }
    assert_eq!(runner.hardware().heater_calls.len(), 3);
    assert!(runner.hardware().heater_calls.iter().all(|&l| l > 0));
}

#[test]
fn chart_data_redraws_after_session_reset() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let hw = MockRoaster::with_readings([150.0, 151.0, 152.0, 90.0]);
    let mut runner = TickRunner::new(&app, hw, RecordingSink::new());

    runner.command(AppCommand::ResetStopwatch, at(0));
    for secs in 1..=3 {
        runner.on_tick(TickKind::Control, at(secs));
    }
    runner.on_tick(TickKind::ChartRefresh, at(3));
    assert_eq!(runner.figure().map(|f| f.len()), Some(3));

    runner.command(AppCommand::ResetStopwatch, at(20));
    runner.on_tick(TickKind::Control, at(21));
    assert_eq!(runner.on_tick(TickKind::ChartData, at(21)), TickOutcome::Completed);

    let figure = runner.figure().unwrap();
    assert_eq!(figure.origin(), at(20));
    let xs: Vec<f64> = figure.points().iter().map(|p| p.time_secs).collect();
    assert_eq!(xs, vec![1.0]);
    let redraws = runner
        .sink()
        .count(|e| matches!(e, AppEvent::ChartRefreshed { .. }));
    assert_eq!(redraws, 2);
}
