//! Fuzz target: `RoasterConfig` JSON parsing and validation
//!
//! Feeds arbitrary bytes through the same path `JsonFileConfig::load` uses
//! and verifies:
//! - No panics in parsing or `validate()`
//! - A config that validates survives a serialise/parse round trip
//! - A validated config builds a service without panicking
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use embassy_time::Instant;
use libfuzzer_sys::fuzz_target;
use roastctl::app::service::RoastService;
use roastctl::config::RoasterConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = serde_json::from_str::<RoasterConfig>(text) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }

    let json = serde_json::to_string(&config).expect("valid config serialises");
    let back: RoasterConfig = serde_json::from_str(&json).expect("own output parses");
    assert!(back.validate().is_ok(), "round trip broke validation");

    let service = RoastService::new(config, Instant::from_secs(0));
    assert!(service.control_state().heat_level <= 100);
});
