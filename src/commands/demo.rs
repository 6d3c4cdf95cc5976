//! `demo`: play the scripted light show.

use anyhow::{Context, Result};

use super::{Session, exit_code};
use crate::display::TerminalProgress;
use crate::engine::demo::{DemoScript, run_demo};
use crate::utils::TerminalGuard;

pub fn run_demo_command(session: &Session) -> Result<i32> {
    let script = DemoScript::standard();

    log_version!();
    log_block_start!(
        "Demo light show ({}s) on {}",
        script.duration().as_secs(),
        session.address()
    );

    let _term = TerminalGuard::new().context("failed to initialize terminal features")?;
    let connector = session.connector();
    let report = run_demo(
        &script,
        connector.as_ref(),
        session.address(),
        session.clock.as_ref(),
        session.token.clone(),
        &mut TerminalProgress::demo(),
    );

    log_end!();
    Ok(exit_code(&report.outcome))
}
