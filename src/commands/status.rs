//! `status`: is the bulb reachable, and what is it doing.

use anyhow::Result;

use super::Session;
use crate::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::device::{DeviceConnector, LightState, describe_state};
use crate::error::SolError;

pub fn run_status_command(session: &Session) -> Result<i32> {
    let connector = session.connector();
    log_version!();
    log_block_start!("Bulb at {}", session.address());

    match query_state(connector.as_ref(), session.address()) {
        Ok((state, (low, high))) => {
            if !state.alias.is_empty() {
                log_indented!("Name:  {}", state.alias);
            }
            if !state.model.is_empty() {
                log_indented!("Model: {}", state.model);
            }
            log_indented!("State: {}", describe_state(&state));
            log_indented!("Color temperature range: {low}K-{high}K");
            log_end!();
            Ok(EXIT_SUCCESS)
        }
        Err(err) => {
            log_indented!("Not found");
            log_pipe!();
            log_error!("{}", err);
            log_end!();
            Ok(EXIT_FAILURE)
        }
    }
}

/// Current state and supported temperature range of the bulb.
pub fn query_state(
    connector: &dyn DeviceConnector,
    address: &str,
) -> Result<(LightState, (u16, u16)), SolError> {
    let mut device = connector.connect(address)?;
    let state = device.refresh_state()?;
    Ok((state, device.temperature_range()))
}

/// One-word lamp status for the setup screen.
pub fn lamp_status(connector: &dyn DeviceConnector, address: &str) -> String {
    match query_state(connector, address) {
        Ok((state, _)) => format!("Connected ({})", describe_state(&state)),
        Err(_) => "Not Found".to_string(),
    }
}
