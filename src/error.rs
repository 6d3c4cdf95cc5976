//! Error taxonomy shared by the scheduling engine and its callers.
//!
//! Library code returns [`SolError`] so callers can match on the failure kind
//! (the CLI suggests profile names, the engine decides what is fatal). Command
//! handlers wrap these in `anyhow` with additional context.

use std::fmt;

use crate::device::DeviceError;

#[derive(Debug, Clone, PartialEq)]
pub enum SolError {
    /// Profile name not present in the catalog.
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },
    /// Clock string is not `HH:MM`, or names a time that cannot be represented.
    InvalidTimeFormat(String),
    /// A profile definition breaks a catalog invariant.
    InvalidProfile(String),
    /// An auto-off delay that cannot be turned into a wall-clock instant.
    InvalidDelay(String),
    /// The device could not be reached.
    Connection { address: String, reason: String },
    /// The device was reached but a command failed.
    Communication(String),
}

impl fmt::Display for SolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolError::UnknownProfile { name, .. } => write!(f, "Unknown profile '{name}'"),
            SolError::InvalidTimeFormat(input) => {
                write!(f, "Invalid time format '{input}'. Use HH:MM (e.g., 06:30)")
            }
            SolError::InvalidProfile(reason) => write!(f, "Invalid profile: {reason}"),
            SolError::InvalidDelay(reason) => write!(f, "Invalid auto-off delay: {reason}"),
            SolError::Connection { address, reason } => {
                write!(f, "Could not connect to bulb at {address}: {reason}")
            }
            SolError::Communication(reason) => write!(f, "Bulb communication failed: {reason}"),
        }
    }
}

impl std::error::Error for SolError {}

impl From<DeviceError> for SolError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Connection { address, reason } => SolError::Connection { address, reason },
            DeviceError::Communication(reason) | DeviceError::Protocol(reason) => {
                SolError::Communication(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_message_shows_example() {
        let err = SolError::InvalidTimeFormat("25:99".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid time format '25:99'. Use HH:MM (e.g., 06:30)"
        );
    }

    #[test]
    fn test_protocol_error_maps_to_communication() {
        let err: SolError = DeviceError::Protocol("missing light_state".into()).into();
        assert_eq!(err, SolError::Communication("missing light_state".into()));
    }
}
