//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the roaster: sampling,
//! rate-of-rise control, the roast session and the chart/table views.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
