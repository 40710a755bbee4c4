//! Integration tests for the chart refresh / chart data interplay and the
//! TTL chart lock.

use embassy_time::Instant;

use roastctl::app::service::RoastService;
use roastctl::chart::{ChartSkip, ChartUpdate};
use roastctl::config::RoasterConfig;
use roastctl::state::StateKey;

use crate::mock_hw::{MockRoaster, RecordingSink};

fn at(secs: u64) -> Instant {
    Instant::from_secs(secs)
}

#[test]
fn refresh_lock_blocks_chart_data_until_expiry() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let mut sink = RecordingSink::new();
    let mut hw = MockRoaster::with_readings([150.0, 151.0, 152.0]);

    app.control_tick(&mut hw, &mut sink, at(9));
    let mut figure = app.refresh_chart(at(10));
    assert_eq!(figure.len(), 1);
    assert!(app.is_locked(StateKey::ChartLock, at(10)));

    app.control_tick(&mut hw, &mut sink, at(11));

    // 2 s into the 5 s lock: no-op, not queued.
    let update = app.update_chart(Some(&figure), at(12));
    assert_eq!(update, ChartUpdate::NoUpdate(ChartSkip::Locked));
    assert_eq!(figure.apply(&update), 0);

    app.control_tick(&mut hw, &mut sink, at(13));

    // 6 s after the refresh the lock has lapsed.
    let update = app.update_chart(Some(&figure), at(16));
    let ChartUpdate::Extend(points) = &update else {
        panic!("expected new points, got {:?}", update);
    };
    let temps: Vec<f64> = points.iter().map(|p| p.temperature).collect();
    assert_eq!(temps, vec![151.0, 152.0]);
    assert_eq!(figure.apply(&update), 2);
    assert_eq!(figure.len(), 3);
}

#[test]
fn lock_is_not_extended_by_reads() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    app.refresh_chart(at(0));
    for secs in 0..5 {
        assert!(app.is_locked(StateKey::ChartLock, at(secs)));
    }
    assert!(!app.is_locked(StateKey::ChartLock, at(5)));
}

#[test]
fn chart_data_without_figure_is_a_no_op() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    assert_eq!(
        app.update_chart(None, at(0)),
        ChartUpdate::NoUpdate(ChartSkip::NoFigure)
    );
}

#[test]
fn chart_data_with_nothing_new_is_a_no_op() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let mut sink = RecordingSink::new();
    let mut hw = MockRoaster::with_readings([150.0]);

    app.control_tick(&mut hw, &mut sink, at(0));
    let figure = app.refresh_chart(at(0));
    assert_eq!(
        app.update_chart(Some(&figure), at(10)),
        ChartUpdate::NoUpdate(ChartSkip::NoNewData)
    );

    let metrics = app.metrics(at(10));
    assert_eq!(metrics.chart_refreshes, 1);
    assert_eq!(metrics.chart_skips, 1);
}

#[test]
fn zero_ttl_never_locks() {
    let config = RoasterConfig {
        chart_lock_ttl_ms: 0,
        ..RoasterConfig::default()
    };
    let app = RoastService::new(config, at(0));
    let figure = app.refresh_chart(at(0));
    assert!(!app.is_locked(StateKey::ChartLock, at(0)));
    assert_eq!(
        app.update_chart(Some(&figure), at(0)),
        ChartUpdate::NoUpdate(ChartSkip::NoNewData)
    );
}

#[test]
fn figure_times_are_relative_to_stopwatch() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let mut sink = RecordingSink::new();
    let mut hw = MockRoaster::with_readings([150.0, 151.0]);

    app.reset_stopwatch(&mut sink, at(20));
    app.control_tick(&mut hw, &mut sink, at(20));
    app.control_tick(&mut hw, &mut sink, at(23));
    let figure = app.refresh_chart(at(23));
    let xs: Vec<f64> = figure.points().iter().map(|p| p.time_secs).collect();
    assert_eq!(xs, vec![0.0, 3.0]);
}

#[test]
fn figure_from_previous_session_is_stale() {
    let app = RoastService::new(RoasterConfig::default(), at(0));
    let mut sink = RecordingSink::new();
    let mut hw = MockRoaster::with_readings([150.0, 151.0, 152.0, 90.0]);

    app.reset_stopwatch(&mut sink, at(0));
    for secs in 1..=3 {
        app.control_tick(&mut hw, &mut sink, at(secs));
    }
    let old = app.refresh_chart(at(3));
    assert_eq!(old.len(), 3);

    app.reset_stopwatch(&mut sink, at(20));
    app.control_tick(&mut hw, &mut sink, at(21));

    // The old origin would plot the new sample at x = 21.
    assert_eq!(
        app.update_chart(Some(&old), at(21)),
        ChartUpdate::NoUpdate(ChartSkip::Stale)
    );

    let fresh = app.refresh_chart(at(21));
    let xs: Vec<f64> = fresh.points().iter().map(|p| p.time_secs).collect();
    assert_eq!(xs, vec![1.0]);
}
