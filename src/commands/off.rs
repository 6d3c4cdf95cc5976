//! `off`: switch the bulb off.

use anyhow::Result;

use super::{Session, report_sol_error};
use crate::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::device::DeviceConnector;
use crate::error::SolError;

pub fn run_off_command(session: &Session) -> Result<i32> {
    let connector = session.connector();
    match turn_off(connector.as_ref(), session.address()) {
        Ok(()) => {
            log_version!();
            log_block_start!("Turned off bulb at {}", session.address());
            log_end!();
            Ok(EXIT_SUCCESS)
        }
        Err(err) => {
            report_sol_error(&err);
            Ok(EXIT_FAILURE)
        }
    }
}

pub fn turn_off(connector: &dyn DeviceConnector, address: &str) -> Result<(), SolError> {
    let mut device = connector.connect(address)?;
    device.turn_off()?;
    Ok(())
}
