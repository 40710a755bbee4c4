//! Fuzz target: control tick and user commands
//!
//! Interprets the input as a script of probe readings, commands and time
//! steps, and verifies after every step:
//! - heat level stays in 0..=100
//! - the exported log stays time-ordered
//! - no tick ever panics, whatever the probe returns
//!
//! cargo fuzz run fuzz_control_tick

#![no_main]

use embassy_time::Instant;
use libfuzzer_sys::fuzz_target;
use roastctl::app::commands::AppCommand;
use roastctl::app::events::AppEvent;
use roastctl::app::ports::{EventSink, HeaterPort, SensorPort};
use roastctl::app::service::RoastService;
use roastctl::config::RoasterConfig;
use roastctl::error::SensorError;

struct ScriptedProbe {
    next: Result<f64, SensorError>,
    last_heat: u8,
}

impl SensorPort for ScriptedProbe {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        self.next
    }
}

impl HeaterPort for ScriptedProbe {
    fn drive_heater(&mut self, level: u8) {
        assert!(level <= 100, "heater driven at {}", level);
        self.last_heat = level;
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let service = RoastService::new(RoasterConfig::default(), Instant::from_secs(0));
    let mut hw = ScriptedProbe {
        next: Ok(20.0),
        last_heat: 0,
    };
    let mut sink = NullSink;
    let mut now_ms: u64 = 0;

    for chunk in data.chunks(4) {
        let [op, a, b, c] = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
            chunk.get(3).copied().unwrap_or(0),
        ];
        let arg = i16::from_le_bytes([a, b]);
        now_ms += u64::from(c) * 10;
        let now = Instant::from_millis(now_ms);

        match op % 8 {
            0 => hw.next = Ok(f64::from(arg) / 10.0),
            1 => hw.next = Err(SensorError::Disconnected),
            2 => hw.next = Ok(f64::NAN),
            3 => {
                service.control_tick(&mut hw, &mut sink, now);
            }
            4 => service.handle_command(AppCommand::SetHeat(i32::from(arg)), &mut hw, &mut sink, now),
            5 => service.handle_command(AppCommand::StartPid(f64::from(arg)), &mut hw, &mut sink, now),
            6 => service.handle_command(AppCommand::StopPid, &mut hw, &mut sink, now),
            _ => service.handle_command(AppCommand::ResetStopwatch, &mut hw, &mut sink, now),
        }

        assert!(service.control_state().heat_level <= 100);
    }

    let summary = service.data_summary(&["temperature", "heat"]);
    assert!(
        summary.rows.windows(2).all(|w| w[0].time_secs <= w[1].time_secs),
        "log out of order"
    );
});
