//! # sol
//!
//! Sunrise alarm library behind the `sol` binary. A sunrise is a named profile
//! of brightness and color-temperature phases, pinned to the clock and played
//! back on a smart bulb in small paced steps.
//!
//! ## Architecture
//!
//! - **Profiles**: `profiles` holds the immutable catalog of sunrise definitions
//! - **Scheduling**: `schedule` turns a request into start/end instants and a
//!   per-phase step plan; `interpolate` computes each step's values
//! - **Execution**: `engine` waits for the start, drives the device and reports
//!   progress; `engine::auto_off` and `engine::demo` build on it
//! - **Devices**: `device` defines the light abstraction with Kasa and dry-run
//!   implementations
//! - **Time**: `time_source` and `cancel` make every wait simulated-clock aware
//!   and interruptible
//! - **Interface**: `args`, `commands`, `config`, `display`, `setup` and
//!   `signals` make up the CLI around the engine

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod cancel;
pub mod commands;
pub mod config;
pub mod constants;
pub mod device;
pub mod display;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod profiles;
pub mod schedule;
pub mod setup;
pub mod signals;
pub mod time_source;
pub mod utils;

pub use engine::{RunOutcome, RunReport, SunriseRunner};
pub use error::SolError;
