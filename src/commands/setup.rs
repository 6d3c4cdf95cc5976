//! `setup`: pick wake time, duration and end temperature interactively, then
//! run the sunrise in this process.

use anyhow::Result;

use super::Session;
use super::run::run_request;
use super::status::lamp_status;
use crate::constants::EXIT_SUCCESS;
use crate::schedule::parse_clock_time;
use crate::setup::{SetupState, run_setup_screen};

pub fn run_setup_command(session: &Session) -> Result<i32> {
    log_version!();
    log_block_start!("Sunrise setup");
    log_indented!("Checking lamp at {}...", session.address());

    let connector = session.connector();
    let status = lamp_status(connector.as_ref(), session.address());

    let initial = match parse_clock_time(session.wake_time()) {
        Ok(wake_time) => SetupState::with_wake_time(wake_time),
        Err(_) => SetupState::default(),
    };

    let Some(state) = run_setup_screen(initial, &status)? else {
        log_block_start!("Setup cancelled");
        log_end!();
        return Ok(EXIT_SUCCESS);
    };

    let request = state
        .to_request(session.address())
        .with_auto_off(session.auto_off_hours()?);
    run_request(session, &request)
}
