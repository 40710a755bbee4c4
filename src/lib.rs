//! Roastctl control-core library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! binary.  Hardware access is confined to the adapters behind the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod chart;
pub mod config;
pub mod control;
pub mod datalog;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod stopwatch;
