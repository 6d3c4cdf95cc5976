//! Light device abstraction.
//!
//! The engine only ever talks to a [`LightDevice`] obtained from a
//! [`DeviceConnector`]. This keeps the sunrise logic independent of the wire
//! protocol and lets tests substitute a recording fake.
//!
//! ## Implementations
//!
//! - **Kasa**: TP-Link Kasa bulbs speaking the legacy local protocol on port 9999
//! - **Dry run**: logs every command and never fails, for rehearsing a profile
//!   without hardware

pub mod dry_run;
pub mod kasa;

use std::fmt;

use crate::constants::{MAXIMUM_TEMP, MINIMUM_TEMP};

pub use dry_run::{DryRunConnector, DryRunDevice};
pub use kasa::{KasaBulb, KasaConnector};

/// Failure talking to a device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The device could not be reached at all.
    Connection { address: String, reason: String },
    /// The device was reached but the exchange failed (timeout, reset, refused).
    Communication(String),
    /// The device answered with something we could not use.
    Protocol(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Connection { address, reason } => {
                write!(f, "cannot reach {address}: {reason}")
            }
            DeviceError::Communication(reason) => write!(f, "communication error: {reason}"),
            DeviceError::Protocol(reason) => write!(f, "unexpected response: {reason}"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Snapshot of a bulb as last reported by the device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightState {
    pub alias: String,
    pub model: String,
    pub is_on: bool,
    pub brightness: Option<u8>,
    pub color_temperature: Option<u16>,
}

/// A dimmable, color-temperature capable light.
///
/// Calls are blocking and are always issued one at a time, in order.
#[cfg_attr(test, mockall::automock)]
pub trait LightDevice {
    /// Query the device and update the cached state.
    fn refresh_state(&mut self) -> Result<LightState, DeviceError>;

    /// Power state as of the last exchange with the device.
    fn is_on(&self) -> bool;

    fn turn_on(&mut self) -> Result<(), DeviceError>;

    fn turn_off(&mut self) -> Result<(), DeviceError>;

    /// Set brightness in percent, 1-100.
    fn set_brightness(&mut self, percent: u8) -> Result<(), DeviceError>;

    /// Set color temperature in Kelvin, clamped to [`LightDevice::temperature_range`].
    fn set_color_temperature(&mut self, kelvin: u16) -> Result<(), DeviceError>;

    /// Color temperatures the hardware accepts.
    fn temperature_range(&self) -> (u16, u16) {
        (MINIMUM_TEMP, MAXIMUM_TEMP)
    }
}

/// Opens a [`LightDevice`] for an address.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn LightDevice>, DeviceError>;
}

/// Human-readable one-line summary of a light state.
pub fn describe_state(state: &LightState) -> String {
    let mut summary = if state.is_on { "ON".to_string() } else { "OFF".to_string() };
    if state.is_on {
        if let Some(brightness) = state.brightness {
            summary.push_str(&format!(" • {brightness}%"));
        }
        if let Some(kelvin) = state.color_temperature.filter(|k| *k > 0) {
            summary.push_str(&format!(" • {kelvin}K"));
        }
    }
    summary
}
