//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements   | Connects to              |
//! |---------------|--------------|--------------------------|
//! | `config_file` | ConfigPort   | JSON file on disk        |
//! | `log_sink`    | EventSink    | `log` facade             |
//! | `sim`         | SensorPort   | First-order drum model   |
//! |               | HeaterPort   |                          |
//!
//! A board build adds a thermocouple adapter for `SensorPort` and uses
//! [`PwmHeater`](crate::drivers::heater::PwmHeater) for `HeaterPort`.

pub mod config_file;
pub mod log_sink;
pub mod sim;
