//! Integration tests for the control tick: probe → rate-of-rise → PID →
//! heater → shared state → log.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration as StdDuration, Instant as StdInstant};

use embassy_time::Instant;

use roastctl::app::events::AppEvent;
use roastctl::app::ports::{SkipReason, TickOutcome};
use roastctl::app::service::{HeatResponse, RoastService};
use roastctl::config::RoasterConfig;
use roastctl::error::SensorError;
use roastctl::state::{StateKey, StateValue};

use crate::mock_hw::{MockRoaster, RecordingSink, SlowRoaster};

fn at(secs: u64) -> Instant {
    Instant::from_secs(secs)
}

fn make_app() -> (RoastService, RecordingSink) {
    (
        RoastService::new(RoasterConfig::default(), at(0)),
        RecordingSink::new(),
    )
}

// ── Manual mode ───────────────────────────────────────────────

#[test]
fn manual_ticks_log_in_order_and_estimate_ror() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0, 152.0, 155.0]);

    app.set_heat(40, &mut hw, &mut sink);
    for secs in [0, 5, 10] {
        assert_eq!(app.control_tick(&mut hw, &mut sink, at(secs)), TickOutcome::Completed);
    }

    let summary = app.data_summary(&["temperature", "heat", "auto_mode"]);
    assert_eq!(summary.len(), 3);
    let temps: Vec<String> = summary.rows.iter().map(|r| r.values[0].to_string()).collect();
    assert_eq!(temps, ["150", "152", "155"]);

    let state = app.control_state();
    assert_eq!(state.heat_level, 40);
    assert!(!state.auto_mode);
    // (155 - 150) / 10 s * 60
    assert!((state.rate_of_rise - 30.0).abs() < 1e-9);
    assert_eq!(state.temperature, Some(155.0));

    // Manual mode never drives the heater from the tick.
    assert_eq!(hw.heater_calls, vec![40]);
}

#[test]
fn set_heat_clamps_and_reflects_value() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::new();

    assert_eq!(app.set_heat(150, &mut hw, &mut sink), HeatResponse::Applied(100));
    assert_eq!(app.get_value(StateKey::HeatLevel), Some(StateValue::Level(100)));
    assert_eq!(app.set_heat(-7, &mut hw, &mut sink), HeatResponse::Applied(0));
    assert_eq!(hw.heater_calls, vec![100, 0]);
    assert_eq!(sink.last(), Some(&AppEvent::HeatSet(0)));
}

// ── Sensor failures ───────────────────────────────────────────

#[test]
fn sensor_fault_skips_tick_and_logs_nothing() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::new();
    hw.push_reading(150.0);
    hw.push_fault(SensorError::Disconnected);
    hw.push_reading(151.0);

    app.control_tick(&mut hw, &mut sink, at(0));
    let outcome = app.control_tick(&mut hw, &mut sink, at(1));
    assert_eq!(
        outcome,
        TickOutcome::Skipped(SkipReason::Sensor(SensorError::Disconnected))
    );
    assert_eq!(app.sample_count(), 1);
    assert_eq!(app.control_state().temperature, Some(150.0));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SensorFault(SensorError::Disconnected))),
        1
    );

    // Next firing retries normally.
    assert_eq!(app.control_tick(&mut hw, &mut sink, at(2)), TickOutcome::Completed);
    assert_eq!(app.sample_count(), 2);
    assert_eq!(app.metrics(at(2)).sensor_faults, 1);
}

#[test]
fn malformed_sample_is_dropped_but_state_still_updates() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([-5.0]);

    assert_eq!(app.control_tick(&mut hw, &mut sink, at(0)), TickOutcome::Completed);
    assert_eq!(app.sample_count(), 0);
    assert_eq!(app.control_state().temperature, Some(-5.0));
    assert_eq!(sink.last(), Some(&AppEvent::SampleDropped(1)));
    assert_eq!(app.metrics(at(0)).samples_dropped, 1);
}

// ── Auto mode ─────────────────────────────────────────────────

#[test]
fn auto_mode_drives_heater_from_pid() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0]);

    app.start_pid(10.0, &mut sink);
    app.control_tick(&mut hw, &mut sink, at(0));

    // First tick: RoR 0, error 10 → 4·10 + 0.2·(10·0.1) = 40.2
    assert_eq!(hw.last_heat(), Some(40));
    let state = app.control_state();
    assert!(state.auto_mode);
    assert_eq!(state.heat_level, 40);
    assert_eq!(state.target_rate_of_rise, Some(10.0));
}

#[test]
fn set_heat_in_auto_mode_retargets() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::new();

    app.start_pid(10.0, &mut sink);
    assert_eq!(app.set_heat(25, &mut hw, &mut sink), HeatResponse::Retargeted(25.0));
    assert!(hw.heater_calls.is_empty());
    assert_eq!(app.control_state().target_rate_of_rise, Some(25.0));
    assert_eq!(sink.last(), Some(&AppEvent::TargetChanged(25.0)));
}

#[test]
fn restarting_auto_mode_clears_windup() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0]);

    // Hold a constant temperature so the error never closes and the
    // integral winds up.
    app.start_pid(10.0, &mut sink);
    for secs in 0..20 {
        app.control_tick(&mut hw, &mut sink, at(secs));
    }
    let wound_up = hw.last_heat().unwrap();
    assert!(wound_up > 60, "integral should have accrued, got {}", wound_up);

    app.stop_pid(&mut sink);
    app.start_pid(10.0, &mut sink);
    app.control_tick(&mut hw, &mut sink, at(100));
    assert_eq!(hw.last_heat(), Some(40), "restart must behave like a fresh run");

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { auto_mode: true, .. })),
        2
    );
}

#[test]
fn update_target_keeps_controller_history() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0]);

    app.start_pid(10.0, &mut sink);
    for secs in 0..10 {
        app.control_tick(&mut hw, &mut sink, at(secs));
    }
    let before = hw.last_heat().unwrap();
    app.update_target(10.0, &mut sink);
    app.control_tick(&mut hw, &mut sink, at(10));
    assert!(hw.last_heat().unwrap() >= before);
}

#[test]
fn stop_pid_holds_last_level() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0]);

    app.start_pid(10.0, &mut sink);
    app.control_tick(&mut hw, &mut sink, at(0));
    let held = hw.last_heat();
    app.stop_pid(&mut sink);

    app.control_tick(&mut hw, &mut sink, at(1));
    assert_eq!(hw.heater_calls.len(), 1);
    assert_eq!(app.control_state().heat_level, held.unwrap());
}

#[test]
fn logged_sample_matches_published_state() {
    let (app, mut sink) = make_app();
    let mut hw = MockRoaster::with_readings([150.0, 151.0]);

    app.start_pid(15.0, &mut sink);
    app.control_tick(&mut hw, &mut sink, at(0));
    app.control_tick(&mut hw, &mut sink, at(1));

    let summary = app.data_summary(&["heat", "auto_mode"]);
    let last = summary.rows.last().unwrap();
    let state = app.control_state();
    assert_eq!(last.values[0].to_string(), state.heat_level.to_string());
    assert_eq!(last.values[1].to_string(), "true");
}

// ── Heater writes vs readers ──────────────────────────────────

const SLOW_WRITE: StdDuration = StdDuration::from_millis(500);

/// Time a `table()` call made while `hw` is inside `drive_heater`.
fn table_latency_during_write(
    app: &RoastService,
    drive: impl FnOnce(&mut SlowRoaster) + Send,
) -> (StdDuration, u8, Vec<u8>) {
    let (tx, rx) = mpsc::channel();
    let mut hw = SlowRoaster::new(150.0, SLOW_WRITE, tx);
    let (latency, heat) = thread::scope(|s| {
        let hw = &mut hw;
        s.spawn(move || drive(hw));
        rx.recv().unwrap();
        let started = StdInstant::now();
        let row = app.table(at(1));
        (started.elapsed(), row.heat_level)
    });
    (latency, heat, hw.heater_calls)
}

#[test]
fn manual_heater_write_does_not_block_table() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let (latency, heat, calls) = table_latency_during_write(&app, |hw| {
        app.set_heat(50, hw, &mut RecordingSink::new());
    });
    assert!(latency < SLOW_WRITE / 2, "table() waited {:?}", latency);
    // Published before the write started.
    assert_eq!(heat, 50);
    assert_eq!(calls, vec![50]);
}

#[test]
fn auto_heater_write_does_not_block_table() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    app.start_pid(10.0, &mut RecordingSink::new());
    let (latency, heat, calls) = table_latency_during_write(&app, |hw| {
        app.control_tick(hw, &mut RecordingSink::new(), at(1));
    });
    assert!(latency < SLOW_WRITE / 2, "table() waited {:?}", latency);
    assert_eq!(calls, vec![heat]);
    assert!(heat > 0);
}
